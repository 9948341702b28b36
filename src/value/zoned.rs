use std::fmt;

use chrono::{DateTime, Utc};

/// Момент в UTC вместе с именем часового пояса для отображения. Имя зоны
/// переносится как есть, база tz не используется.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZonedTime {
    utc: DateTime<Utc>,
    zone: String,
}

impl ZonedTime {
    pub fn new(
        utc: DateTime<Utc>,
        zone: impl Into<String>,
    ) -> Self {
        Self {
            utc,
            zone: zone.into(),
        }
    }

    pub fn utc(&self) -> DateTime<Utc> {
        self.utc
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }
}

impl fmt::Display for ZonedTime {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} {}", self.utc.format("%Y-%m-%d %H:%M:%S%.f UTC"), self.zone)
    }
}
