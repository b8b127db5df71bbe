use owo_colors::OwoColorize;

/// 一括更新の結果サマリ（先頭記号とメッセージ）
pub struct CommandSummary {
    pub prefix: String,
    pub message: String,
}

impl CommandSummary {
    pub fn format(success: usize, failure: usize) -> Self {
        match (success, failure) {
            (_, f) if f > 0 => Self {
                prefix: "✗".red().to_string(),
                message: format!("{} updated, {} failed", success.green(), f.red()),
            },
            (s, _) if s > 0 => Self {
                prefix: "✓".green().to_string(),
                message: format!("{} addon(s) updated", s.green()),
            },
            _ => Self {
                prefix: "•".yellow().to_string(),
                message: "All addons are up to date".to_string(),
            },
        }
    }

    pub fn print(&self) {
        println!("{} {}", self.prefix, self.message);
    }
}

/// 長いコミットIDを短縮表示
pub fn short_version(version: &str) -> &str {
    let is_sha = version.len() >= 20 && version.chars().all(|c| c.is_ascii_hexdigit());
    if is_sha {
        &version[..7]
    } else {
        version
    }
}
