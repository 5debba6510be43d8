//! 定义 ASS 生成的配置选项。

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// ASS 生成选项。
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
pub struct AssRenderOptions {
    /// 目标画布宽度（像素）。
    pub width: u32,
    /// 目标画布高度（像素）。
    pub height: u32,
    /// 画布底部保留的高度（像素）。这些行不参与弹幕行分配，
    /// 可用来避开播放器自带的控制栏或字幕。
    pub bottom_reserved: u32,
    /// 字体名称。
    pub font_face: String,
    /// 基准字号。弹幕自带的字号会按 `字号 / 25` 的比例换算。
    pub font_size: f64,
    /// 全局不透明度 (0.0..=1.0)。
    pub text_opacity: f64,
    /// 滚动弹幕飞过整个画布的时长（秒）。
    pub duration_marquee: f64,
    /// 固定弹幕的停留时长（秒）。
    pub duration_still: f64,
    /// 屏蔽规则（正则表达式）。命中任意一条的普通弹幕会被丢弃，
    /// 定位弹幕不受影响。
    pub filters: Vec<String>,
    /// 行道放不下时是否直接丢弃弹幕。为 `false` 时会挤进最旧的行。
    pub reduce_comments: bool,
    /// 自定义样式名。为 `None` 时每次生成随机样式名。
    pub style_name: Option<String>,
}

impl Default for AssRenderOptions {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            bottom_reserved: 0,
            font_face: "sans-serif".to_string(),
            font_size: 25.0,
            text_opacity: 1.0,
            duration_marquee: 5.0,
            duration_still: 5.0,
            filters: Vec::new(),
            reduce_comments: false,
            style_name: None,
        }
    }
}
