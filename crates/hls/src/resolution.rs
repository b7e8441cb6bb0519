use std::str::FromStr;

use serde::Serialize;

/// Represents video resolution information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Error returned when a `RESOLUTION` value is not `<width>x<height>`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid resolution '{0}'")]
pub struct ParseResolutionError(String);

impl FromStr for Resolution {
    type Err = ParseResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseResolutionError(s.to_string());
        let (width, height) = s.trim().split_once(['x', 'X']).ok_or_else(err)?;
        let width = width.parse().map_err(|_| err())?;
        let height = height.parse().map_err(|_| err())?;
        Ok(Resolution::new(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        assert_eq!("960x540".parse::<Resolution>(), Ok(Resolution::new(960, 540)));
        assert_eq!(
            "1920X1080".parse::<Resolution>().unwrap().to_string(),
            "1920x1080"
        );
        assert!("960".parse::<Resolution>().is_err());
        assert!("axb".parse::<Resolution>().is_err());
    }
}
