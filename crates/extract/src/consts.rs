use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Module resource directory present in projects containing Perspective resources.
pub const PERSPECTIVE_MODULE: &str = "com.inductiveautomation.perspective";
/// Module resource directory present in projects containing Vision resources.
pub const VISION_MODULE: &str = "com.inductiveautomation.vision";

/// `ignition.conf`: initial JVM heap size.
pub const INIT_MEMORY_KEY: &str = "wrapper.java.initmemory";
/// `ignition.conf`: maximum JVM heap size.
pub const MAX_MEMORY_KEY: &str = "wrapper.java.maxmemory";
/// `redundancy.xml`: role of this node in a redundant pair.
pub const NODE_ROLE_KEY: &str = "redundancy.noderole";

// Java wrapper memory settings are megabytes, but people write "2g" or "512M" anyway.
regex!(MEMORY_REGEX, r"^\s*(\d+)\s*([kKmMgG])?[bB]?\s*$");
