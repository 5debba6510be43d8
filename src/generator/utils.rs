//! ASS 生成器的辅助函数。

/// 将秒数格式化为 ASS 时间戳（`H:MM:SS.CC`），四舍五入到厘秒。
pub(super) fn format_timestamp(seconds: f64) -> String {
    let total_cs = ((seconds * 1000.0).round() as i64 + 5) / 10;
    let cs = total_cs % 100;
    let total_seconds = total_cs / 100;
    let second = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let minute = total_minutes % 60;
    let hour = total_minutes / 60;
    format!("{hour}:{minute:02}:{second:02}.{cs:02}")
}

/// 转义 ASS 事件文本。
///
/// 反斜杠和花括号会与覆盖标签冲突，需要转义；换行符替换为 `\N`。
/// 行首行尾的普通空格会被 ASS 渲染器折叠，替换为 U+2007（数字空格）。
pub(super) fn escape_ass_text(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace('}', "\\}");
    escaped
        .split('\n')
        .map(|line| {
            let padded = pad_edge_spaces(line);
            if padded.is_empty() {
                " ".to_string()
            } else {
                padded
            }
        })
        .collect::<Vec<_>>()
        .join("\\N")
}

fn pad_edge_spaces(line: &str) -> String {
    let stripped = line.trim_matches(' ');
    if stripped.len() == line.len() {
        line.to_string()
    } else {
        let leading = line.len() - line.trim_start_matches(' ').len();
        let trailing = line.len() - line.trim_end_matches(' ').len();
        format!(
            "{}{stripped}{}",
            "\u{2007}".repeat(leading),
            "\u{2007}".repeat(trailing)
        )
    }
}

/// 将 24 位 RGB 颜色转换为 ASS 使用的 BGR 十六进制串。
///
/// VobSub 渲染按 BT.601 色彩空间解码，这里把 BT.709 的颜色值
/// 转换过去以保持观感，纯黑和纯白不受影响。
pub(super) fn convert_color(rgb: u32) -> String {
    if rgb == 0x00_0000 {
        return "000000".to_string();
    }
    if rgb == 0xFF_FFFF {
        return "FFFFFF".to_string();
    }
    let r = f64::from((rgb >> 16) & 0xff);
    let g = f64::from((rgb >> 8) & 0xff);
    let b = f64::from(rgb & 0xff);
    format!(
        "{:02X}{:02X}{:02X}",
        clip_byte(r * 0.009_563_840_880_806_56 + g * 0.032_172_545_402_037_29 + b * 0.958_263_613_717_156_07),
        clip_byte(r * -0.104_939_331_420_753_90 + g * 1.172_314_781_918_551_54 + b * -0.067_375_450_497_797_57),
        clip_byte(r * 0.913_489_123_739_876_45 + g * 0.078_585_363_725_325_10 + b * 0.007_925_512_534_798_42)
    )
}

fn clip_byte(value: f64) -> u8 {
    if value > 255.0 {
        255
    } else if value < 0.0 {
        0
    } else {
        value.round() as u8
    }
}

/// 把 0.0..=1.0 的不透明度换算为 ASS 的 alpha 字节（0 为不透明）。
pub(super) fn alpha_byte(opacity: f64) -> u8 {
    (255.0 - (opacity * 255.0).round()).clamp(0.0, 255.0) as u8
}
