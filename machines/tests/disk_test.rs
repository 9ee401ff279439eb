use pulsar_machines::disk::{DiskKind, SectorError, check_sector};

// =============================================================================
// Track bounds
// =============================================================================

#[test]
fn test_track_zero_is_illegal() {
    for kind in [DiskKind::D64, DiskKind::D71, DiskKind::D80, DiskKind::D81, DiskKind::D82] {
        assert_eq!(check_sector(kind, 0, 0), Err(SectorError::BadTrack { track: 0 }));
    }
}

#[test]
fn test_last_track_per_format() {
    let cases = [
        (DiskKind::D64, 35),
        (DiskKind::D64Ext40, 40),
        (DiskKind::D67, 35),
        (DiskKind::D71, 70),
        (DiskKind::D80, 77),
        (DiskKind::D81, 80),
        (DiskKind::D82, 154),
    ];
    for (kind, last) in cases {
        assert!(check_sector(kind, last, 0).is_ok(), "{kind:?} track {last}");
        let err = check_sector(kind, last + 1, 0).unwrap_err();
        assert_eq!(err.code(), -2, "{kind:?} track {}", last + 1);
    }
}

// =============================================================================
// Sector bounds by speed zone
// =============================================================================

#[test]
fn test_d64_zones() {
    for (track, sectors) in [(1, 21), (17, 21), (18, 19), (24, 19), (25, 18), (30, 18), (31, 17), (35, 17)] {
        assert!(check_sector(DiskKind::D64, track, sectors - 1).is_ok());
        assert_eq!(
            check_sector(DiskKind::D64, track, sectors),
            Err(SectorError::BadSector { track, sector: sectors })
        );
    }
}

#[test]
fn test_d67_middle_zone_has_twenty_sectors() {
    assert!(check_sector(DiskKind::D67, 18, 19).is_ok());
    assert!(check_sector(DiskKind::D67, 18, 20).is_err());
    assert!(check_sector(DiskKind::D64, 18, 19).is_err());
}

#[test]
fn test_double_sided_formats_mirror_first_side() {
    assert!(check_sector(DiskKind::D71, 36, 20).is_ok());
    assert!(check_sector(DiskKind::D71, 53, 18).is_ok());
    assert!(check_sector(DiskKind::D71, 53, 19).is_err());
    assert!(check_sector(DiskKind::D82, 78, 28).is_ok());
    assert!(check_sector(DiskKind::D82, 154, 23).is_err());
}

#[test]
fn test_d80_and_d81_geometry() {
    assert!(check_sector(DiskKind::D80, 39, 28).is_ok());
    assert!(check_sector(DiskKind::D80, 40, 27).is_err());
    assert!(check_sector(DiskKind::D80, 77, 22).is_ok());
    assert!(check_sector(DiskKind::D81, 80, 39).is_ok());
    assert_eq!(check_sector(DiskKind::D81, 40, 40).unwrap_err().code(), -3);
}
