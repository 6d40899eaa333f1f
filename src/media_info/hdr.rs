//! HDR format inference from color metadata and side data.

use super::model::HdrFormat;

const PQ_TRANSFER: &str = "smpte2084";
const HLG_TRANSFER: &str = "arib-std-b67";
const HDR_PRIMARIES: &str = "bt2020";
const SDR_TRANSFERS: &[&str] = &["bt709", "bt601", "smpte170m", "bt470bg"];

/// Independent signals the classification cascade looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct HdrSignals<'a> {
    pub bit_depth: u32,
    pub color_primaries: Option<&'a str>,
    pub transfer_characteristics: Option<&'a str>,
    /// Dolby Vision configuration record present
    pub dolby_vision: bool,
    /// HDR10+ (SMPTE 2094-40) dynamic metadata present
    pub dynamic_metadata: bool,
    /// Mastering display or content light level metadata present
    pub static_metadata: bool,
}

pub fn is_pq(transfer: Option<&str>) -> bool {
    transfer == Some(PQ_TRANSFER)
}

fn is_hlg(transfer: Option<&str>) -> bool {
    transfer == Some(HLG_TRANSFER)
}

/// Classify HDR in priority order. Anything below 10-bit is SDR.
pub fn classify_hdr(signals: &HdrSignals<'_>) -> HdrFormat {
    if signals.bit_depth < 10 {
        return HdrFormat::None;
    }

    let transfer = signals.transfer_characteristics;

    if signals.dolby_vision {
        return if is_pq(transfer) {
            if signals.dynamic_metadata {
                HdrFormat::DolbyVisionHdr10Plus
            } else {
                HdrFormat::DolbyVisionHdr10
            }
        } else if is_hlg(transfer) {
            HdrFormat::DolbyVisionHlg
        } else if transfer.is_some_and(|t| SDR_TRANSFERS.contains(&t)) {
            HdrFormat::DolbyVisionSdr
        } else {
            HdrFormat::DolbyVision
        };
    }

    if signals.color_primaries != Some(HDR_PRIMARIES) {
        return HdrFormat::None;
    }

    if is_hlg(transfer) {
        HdrFormat::Hlg10
    } else if is_pq(transfer) {
        if signals.dynamic_metadata {
            HdrFormat::Hdr10Plus
        } else if signals.static_metadata {
            HdrFormat::Hdr10
        } else {
            HdrFormat::Pq10
        }
    } else {
        HdrFormat::None
    }
}
