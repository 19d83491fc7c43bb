pub mod http {

    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub const USER_AGENT: &str = "bangumi-rss/0.1.0";
}

pub mod ingest {

    pub const FETCH_ATTEMPTS: u32 = 3;

    pub const RETRY_DELAY_SECS: u64 = 5;

    /// Activity kind written after every processed feed source.
    pub const ACTIVITY_KIND_RSS: &str = "rss";
}

pub mod catalog {
    use std::time::Duration;

    pub const UPSERT_ATTEMPTS: u32 = 5;

    /// Multiplied by the attempt number.
    pub const UPSERT_RETRY_DELAY: Duration = Duration::from_millis(50);
}

pub mod tracker {

    /// Host fragment identifying the recognized tracker.
    pub const HOST_MARKER: &str = "mikanani";

    /// Source tag stored on catalog entries and episodes from that tracker.
    pub const SOURCE_TAG: &str = "mikan";
}

pub mod subtitles {

    /// Subtitle markers that let an item through regardless of include keywords.
    pub const CHINESE_ALLOW_LIST: &[&str] = &[
        "简", "繁", "CHS", "CHT", "GB", "BIG5", "中字", "简中", "繁中",
    ];
}
