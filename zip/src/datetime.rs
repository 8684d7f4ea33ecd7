use {
    crate::error::{ZipError, ZipResult},
    chrono::{DateTime, Datelike, TimeZone, Timelike, Utc},
};

const DOS_EPOCH_YEAR: u16 = 1980;
/// Seven bits of year offset.
const DOS_LAST_YEAR: u16 = DOS_EPOCH_YEAR + 0x7F;

/// Calendar timestamp in UTC.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ZipDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Packed MS-DOS date and time words as stored in ZIP headers.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct DosDateTime {
    pub date: u16,
    pub time: u16,
}

impl ZipDateTime {
    pub fn now() -> Self {
        Utc::now().into()
    }

    /// Years outside 1980..=2107 are clamped; seconds lose their low bit.
    pub fn to_dos(&self) -> DosDateTime {
        let year = self.year.clamp(DOS_EPOCH_YEAR, DOS_LAST_YEAR) - DOS_EPOCH_YEAR;
        let date = (year << 9) | ((self.month as u16 & 0x0F) << 5) | (self.day as u16 & 0x1F);
        let time = ((self.hour as u16 & 0x1F) << 11)
            | ((self.minute as u16 & 0x3F) << 5)
            | ((self.second as u16 / 2) & 0x1F);

        DosDateTime { date, time }
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for ZipDateTime {
    fn from(value: DateTime<Tz>) -> Self {
        let value = value.with_timezone(&Utc);

        Self {
            year: value.year().clamp(0, u16::MAX as i32) as u16,
            month: value.month() as u8,
            day: value.day() as u8,
            hour: value.hour() as u8,
            minute: value.minute() as u8,
            second: value.second() as u8,
        }
    }
}

impl From<DosDateTime> for ZipDateTime {
    fn from(value: DosDateTime) -> Self {
        let DosDateTime { date, time } = value;

        Self {
            year: (date >> 9) + DOS_EPOCH_YEAR,
            month: ((date >> 5) & 0x0F) as u8,
            day: (date & 0x1F) as u8,
            hour: (time >> 11) as u8,
            minute: ((time >> 5) & 0x3F) as u8,
            second: ((time & 0x1F) << 1) as u8,
        }
    }
}

impl DosDateTime {
    /// Header order: time word first, then date word.
    pub fn to_le_bytes(self) -> [u8; 4] {
        let [t0, t1] = self.time.to_le_bytes();
        let [d0, d1] = self.date.to_le_bytes();
        [t0, t1, d0, d1]
    }
}

impl TryFrom<&[u8]> for DosDateTime {
    type Error = ZipError;

    fn try_from(value: &[u8]) -> ZipResult<Self> {
        let [t0, t1, d0, d1]: [u8; 4] = value.get(..4).unwrap_or(value).try_into()?;

        Ok(Self {
            date: u16::from_le_bytes([d0, d1]),
            time: u16::from_le_bytes([t0, t1]),
        })
    }
}
