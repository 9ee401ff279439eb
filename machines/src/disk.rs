//! Track/sector bounds for Commodore disk images.
//!
//! Only the geometry check lives here: whether a track/sector pair exists
//! on a given image type. Reading or writing image files is out of scope.

use thiserror::Error;

/// Error codes shared with the drive code that reports them.
pub const BAD_TRACK_CODE: i32 = -2;
pub const BAD_SECTOR_CODE: i32 = -3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SectorError {
    #[error("illegal track {track}")]
    BadTrack { track: u32 },
    #[error("illegal sector {sector} on track {track}")]
    BadSector { track: u32, sector: u32 },
}

impl SectorError {
    pub fn code(self) -> i32 {
        match self {
            Self::BadTrack { .. } => BAD_TRACK_CODE,
            Self::BadSector { .. } => BAD_SECTOR_CODE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskKind {
    /// 1541, 35 tracks.
    D64,
    /// 1541 with the extended 40-track format.
    D64Ext40,
    /// 2040 (DOS 1), 35 tracks.
    D67,
    /// 1571, double sided, 70 tracks.
    D71,
    /// 8050, 77 tracks.
    D80,
    /// 1581, 80 tracks of 40 sectors.
    D81,
    /// 8250, double sided, 154 tracks.
    D82,
}

/// (last track of zone, sectors per track) for the zoned formats.
const ZONES_1541: &[(u32, u32)] = &[(17, 21), (24, 19), (30, 18), (40, 17)];
const ZONES_2040: &[(u32, u32)] = &[(17, 21), (24, 20), (30, 18), (35, 17)];
const ZONES_8050: &[(u32, u32)] = &[(39, 29), (53, 27), (64, 25), (77, 23)];

fn zoned(zones: &[(u32, u32)], track: u32) -> u32 {
    zones
        .iter()
        .find(|&&(last, _)| track <= last)
        .map_or(0, |&(_, sectors)| sectors)
}

impl DiskKind {
    pub fn tracks(self) -> u32 {
        match self {
            Self::D64 | Self::D67 => 35,
            Self::D64Ext40 => 40,
            Self::D71 => 70,
            Self::D80 => 77,
            Self::D81 => 80,
            Self::D82 => 154,
        }
    }

    /// Sectors on `track` (1-based), or 0 for a track the format lacks.
    pub fn sectors_per_track(self, track: u32) -> u32 {
        if track == 0 || track > self.tracks() {
            return 0;
        }
        match self {
            Self::D64 | Self::D64Ext40 => zoned(ZONES_1541, track),
            Self::D67 => zoned(ZONES_2040, track),
            // The second side repeats the first.
            Self::D71 => zoned(ZONES_1541, (track - 1) % 35 + 1),
            Self::D80 => zoned(ZONES_8050, track),
            Self::D82 => zoned(ZONES_8050, (track - 1) % 77 + 1),
            Self::D81 => 40,
        }
    }

    /// Total sectors on the image.
    pub fn total_sectors(self) -> u32 {
        (1..=self.tracks()).map(|t| self.sectors_per_track(t)).sum()
    }
}

/// Check that `track`/`sector` exists on an image of `kind`. Tracks count
/// from 1, sectors from 0.
pub fn check_sector(kind: DiskKind, track: u32, sector: u32) -> Result<(), SectorError> {
    let sectors = kind.sectors_per_track(track);
    if sectors == 0 {
        return Err(SectorError::BadTrack { track });
    }
    if sector >= sectors {
        return Err(SectorError::BadSector { track, sector });
    }
    Ok(())
}
