use std::fmt;

/// Minimum distance, in bytes, that keeps two objects off the same cache line.
///
/// There is no portable way to ask the compiler for this, so we go with a
/// per-architecture guess. On x86-64, aarch64 and powerpc64 the spatial
/// prefetcher pulls lines in pairs, hence 128. Whatever the guess, the
/// driver compares it against [`detect_line_size`] and complains loudly if
/// the machine disagrees.
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "powerpc64"))]
pub const DESTRUCTIVE_INTERFERENCE_SIZE: usize = 128;
#[cfg(target_arch = "s390x")]
pub const DESTRUCTIVE_INTERFERENCE_SIZE: usize = 256;
#[cfg(any(
    target_arch = "arm",
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "hexagon",
))]
pub const DESTRUCTIVE_INTERFERENCE_SIZE: usize = 32;
#[cfg(not(any(
    target_arch = "x86_64",
    target_arch = "aarch64",
    target_arch = "powerpc64",
    target_arch = "s390x",
    target_arch = "arm",
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "hexagon",
)))]
pub const DESTRUCTIVE_INTERFERENCE_SIZE: usize = 64;

/// Maximum span, in bytes, that two objects may cover and still be
/// guaranteed to land on one cache line.
#[cfg(any(
    target_arch = "arm",
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "hexagon",
))]
pub const CONSTRUCTIVE_INTERFERENCE_SIZE: usize = 32;
#[cfg(not(any(
    target_arch = "arm",
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "sparc",
    target_arch = "hexagon",
)))]
pub const CONSTRUCTIVE_INTERFERENCE_SIZE: usize = 64;

#[cfg(target_os = "linux")]
const SYSFS_LINE_SIZE: &str = "/sys/devices/system/cpu/cpu0/cache/index0/coherency_line_size";

/// The pair of interference sizes the layouts were built against.
///
/// Type layouts are fixed at compile time, so changing these values does
/// not move any field. They are what the driver reports and checks the
/// host against; [`InterferenceSizes::HOST`] is what the layouts use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterferenceSizes {
    pub destructive:  usize,
    pub constructive: usize,
}

impl InterferenceSizes {
    pub const HOST: Self = Self {
        destructive:  DESTRUCTIVE_INTERFERENCE_SIZE,
        constructive: CONSTRUCTIVE_INTERFERENCE_SIZE,
    };

    /// Lists every way in which `line` (the machine's real cache line
    /// size) breaks the assumptions behind these sizes.
    pub fn check_against(&self, line: usize) -> Vec<Mismatch> {
        let mut res = vec![];
        if self.destructive < line {
            res.push(Mismatch::DestructiveTooSmall {
                assumed: self.destructive,
                line,
            });
        }
        if self.constructive > line {
            res.push(Mismatch::ConstructiveTooLarge {
                assumed: self.constructive,
                line,
            });
        }

        res
    }
}

impl Default for InterferenceSizes {
    fn default() -> Self {
        Self::HOST
    }
}

/// An assumption that the running machine does not honor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mismatch {
    /// Aligned slots may still share a line.
    DestructiveTooSmall { assumed: usize, line: usize },
    /// Packed pairs may straddle two lines.
    ConstructiveTooLarge { assumed: usize, line: usize },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::DestructiveTooSmall { assumed, line } => write!(
                f,
                "destructive interference size {} is below the {}-byte cache line; \
                 aligned results are not trustworthy",
                assumed, line
            ),
            Mismatch::ConstructiveTooLarge { assumed, line } => write!(
                f,
                "constructive interference size {} exceeds the {}-byte cache line; \
                 packed-pair results are not trustworthy",
                assumed, line
            ),
        }
    }
}

/// Asks the running machine for its L1 data cache line size.
///
/// `None` means nobody would tell us.
pub fn detect_line_size() -> Option<usize> {
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    {
        // SAFETY: `sysconf` has no preconditions.
        let reported = unsafe { libc::sysconf(libc::_SC_LEVEL1_DCACHE_LINESIZE) };
        if reported > 0 {
            return Some(reported as usize);
        }
    }
    #[cfg(target_os = "linux")]
    {
        if let Ok(raw) = std::fs::read_to_string(SYSFS_LINE_SIZE) {
            return raw.trim().parse::<usize>().ok().filter(|&l| l > 0);
        }
    }

    None
}
