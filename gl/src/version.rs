use std::fmt;
use std::str::FromStr;

use anyhow::Context as _;

/// An api version tier. Ordering is (major, minor), lexicographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(pub u32, pub u32);

impl Version {
    pub const V1_0: Version = Version(1, 0);
    pub const V1_1: Version = Version(1, 1);
    pub const V1_2: Version = Version(1, 2);
    pub const V1_3: Version = Version(1, 3);
    pub const V1_4: Version = Version(1, 4);
    pub const V1_5: Version = Version(1, 5);
    pub const V2_0: Version = Version(2, 0);
    pub const V2_1: Version = Version(2, 1);
    pub const V3_0: Version = Version(3, 0);
    pub const V3_1: Version = Version(3, 1);
    pub const V3_2: Version = Version(3, 2);
    pub const V3_3: Version = Version(3, 3);
    pub const V4_0: Version = Version(4, 0);
    pub const V4_1: Version = Version(4, 1);
    pub const V4_2: Version = Version(4, 2);
    pub const V4_3: Version = Version(4, 3);
    pub const V4_4: Version = Version(4, 4);
    pub const V4_5: Version = Version(4, 5);
    pub const V4_6: Version = Version(4, 6);

    /// Every tier an entry point can be pinned to, lowest first.
    pub const TIERS: [Version; 19] = [
        Self::V1_0,
        Self::V1_1,
        Self::V1_2,
        Self::V1_3,
        Self::V1_4,
        Self::V1_5,
        Self::V2_0,
        Self::V2_1,
        Self::V3_0,
        Self::V3_1,
        Self::V3_2,
        Self::V3_3,
        Self::V4_0,
        Self::V4_1,
        Self::V4_2,
        Self::V4_3,
        Self::V4_4,
        Self::V4_5,
        Self::V4_6,
    ];

    pub const LATEST: Version = Self::V4_6;
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

impl FromStr for Version {
    type Err = anyhow::Error;

    // NOTE: GL_VERSION strings carry trailing release/vendor text
    // ("4.6.0 NVIDIA 535.86.05"); only the leading major.minor matters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.split_whitespace().next().context("empty version string")?;
        let mut parts = s.split('.');
        let major: u32 = parts
            .next()
            .context("missing major")?
            .parse()
            .context("invalid major")?;
        let minor: u32 = parts
            .next()
            .context("missing minor")?
            .parse()
            .context("invalid minor")?;
        Ok(Version(major, minor))
    }
}
