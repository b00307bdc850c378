//! Data center ids and their shifted forms.
//!
//! A shifted DC id packs a routing hint above the bare id:
//! `shift * 10000 + dc_id`. Different shifts to the same DC get separate
//! sessions (main, media download, upload, export and so on).

/// A bare data center id (`1..10000`).
pub type DcId = i32;

/// A DC id with a session shift folded in.
pub type ShiftedDcId = i32;

pub const DC_SHIFT: i32 = 10000;

pub const CONFIG_DC_SHIFT: i32 = 0x01;
pub const LOGOUT_DC_SHIFT: i32 = 0x02;
pub const UPDATER_DC_SHIFT: i32 = 0x03;
pub const EXPORT_DC_SHIFT: i32 = 0x04;
pub const EXPORT_MEDIA_DC_SHIFT: i32 = 0x05;
pub const MAX_MEDIA_DC_COUNT: i32 = 0x10;
pub const BASE_DOWNLOAD_DC_SHIFT: i32 = 0x10;
pub const BASE_UPLOAD_DC_SHIFT: i32 = 0x20;
pub const DESTROY_KEY_START_DC_SHIFT: i32 = 0x100;

pub fn shift_dc_id(dc_id: DcId, shift: i32) -> ShiftedDcId {
    dc_id + DC_SHIFT * shift
}

pub fn bare_dc_id(shifted: ShiftedDcId) -> DcId {
    shifted % DC_SHIFT
}

pub fn dc_id_shift(shifted: ShiftedDcId) -> i32 {
    shifted / DC_SHIFT
}

/// Shifted id of the `index`-th download session to `dc_id`.
pub fn download_dc_id(dc_id: DcId, index: i32) -> ShiftedDcId {
    assert!((0..MAX_MEDIA_DC_COUNT).contains(&index), "download session index out of range");
    shift_dc_id(dc_id, BASE_DOWNLOAD_DC_SHIFT + index)
}

/// Shifted id of the `index`-th upload session to `dc_id`.
pub fn upload_dc_id(dc_id: DcId, index: i32) -> ShiftedDcId {
    assert!((0..MAX_MEDIA_DC_COUNT).contains(&index), "upload session index out of range");
    shift_dc_id(dc_id, BASE_UPLOAD_DC_SHIFT + index)
}

/// Whether `shifted` names a temporary session opened to destroy a key.
pub fn is_destroy_key_dc_id(shifted: ShiftedDcId) -> bool {
    dc_id_shift(shifted) >= DESTROY_KEY_START_DC_SHIFT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_roundtrip() {
        let shifted = shift_dc_id(2, EXPORT_MEDIA_DC_SHIFT);
        assert_eq!(shifted, 50002);
        assert_eq!(bare_dc_id(shifted), 2);
        assert_eq!(dc_id_shift(shifted), EXPORT_MEDIA_DC_SHIFT);
    }

    #[test]
    fn media_sessions_do_not_overlap() {
        assert_eq!(dc_id_shift(download_dc_id(4, 15)), 0x1f);
        assert_eq!(dc_id_shift(upload_dc_id(4, 0)), 0x20);
        assert!(!is_destroy_key_dc_id(upload_dc_id(4, 15)));
        assert!(is_destroy_key_dc_id(shift_dc_id(4, DESTROY_KEY_START_DC_SHIFT)));
    }

    #[test]
    #[should_panic]
    fn download_index_is_bounded() {
        download_dc_id(1, MAX_MEDIA_DC_COUNT);
    }
}
