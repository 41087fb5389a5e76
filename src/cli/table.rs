//! Text rendering for the menu

use crate::postprocess::TargetCodec;
use crate::StreamFormat;

/// Banner printed above the main menu.
pub const BANNER: &str = r"
    #############################################
    #      Audiophile Audio Downloader          #
    #         Highest-fidelity audio            #
    #      Human-paced retrieval                #
    #############################################
";

/// Main menu entries, 1-based.
pub const MAIN_MENU: [&str; 4] = [
    "Single Audio Download (Highest Quality)",
    "Playlist Download",
    "Audio Format Converter",
    "Exit",
];

const HEADER: &str = "Index | Format ID | Extension | Bitrate | Quality";

/// Format table, numbered from 1.
pub fn format_table(formats: &[StreamFormat]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    out.push_str(&"-".repeat(50));
    out.push('\n');
    for (i, fmt) in formats.iter().enumerate() {
        out.push_str(&format!(
            "{:5} | {:9} | {:9} | {:>7} | {}\n",
            i + 1,
            fmt.format_id,
            fmt.ext,
            format_bitrate(fmt.bitrate),
            fmt.format_note
        ));
    }
    out
}

/// Bitrate in kbit/s, `-` when unknown.
pub fn format_bitrate(kbps: f64) -> String {
    if kbps > 0.0 {
        format!("{kbps:.0}k")
    } else {
        "-".to_string()
    }
}

/// Numbered list of conversion targets.
pub fn codec_menu() -> String {
    TargetCodec::ALL
        .iter()
        .enumerate()
        .map(|(i, codec)| format!("{}. {}\n", i + 1, codec.extension().to_uppercase()))
        .collect()
}

/// Main menu, numbered from 1.
pub fn main_menu() -> String {
    let mut out = String::from("Main Menu:\n");
    for (i, entry) in MAIN_MENU.iter().enumerate() {
        out.push_str(&format!("{}. {entry}\n", i + 1));
    }
    out
}
