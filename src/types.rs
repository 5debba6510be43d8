//! 定义弹幕数据模型。
//!
//! 所有上游数据（Bilibili XML、AcFun JSON）都先被规范化为 [`Comment`]，
//! 再交给生成器做行分配和渲染。

use serde::{Deserialize, Serialize};

/// 枚举：表示一条弹幕的显示方式。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommentMode {
    /// 从右向左滚动。
    Scroll,
    /// 从左向右滚动。
    ScrollReverse,
    /// 顶部固定。
    TopStatic,
    /// 底部固定。
    BottomStatic,
    /// 高级定位弹幕，以关键帧描述位置与动画，不参与行分配。
    Positioned(PositionedPayload),
}

impl CommentMode {
    /// 非定位弹幕在占用网格中的行道编号。
    #[must_use]
    pub const fn lane_index(&self) -> Option<usize> {
        match self {
            Self::Scroll => Some(0),
            Self::TopStatic => Some(1),
            Self::BottomStatic => Some(2),
            Self::ScrollReverse => Some(3),
            Self::Positioned(_) => None,
        }
    }

    /// 是否为固定位置（非滚动）的弹幕。
    #[must_use]
    pub const fn is_static(&self) -> bool {
        matches!(self, Self::TopStatic | Self::BottomStatic)
    }
}

/// 高级定位弹幕的载荷。两个平台的数据结构不同，用变体区分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PositionedPayload {
    /// 单段 from → to 动画，对应 Bilibili mode 7 弹幕。
    SingleKeyframe(BiliPositionedPayload),
    /// 开放式关键帧序列，对应 AcFun 高级弹幕。
    KeyframeSequence(AcfunPositionedPayload),
}

/// Bilibili 高级弹幕中的一个坐标分量。
///
/// 上游用 JSON 数字类型区分语义：整数是旧版播放器坐标系中的绝对像素，
/// 不大于 1 的浮点数是相对播放器宽或高的比例。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BiliCoordinate {
    /// 旧版播放器坐标系中的绝对像素值。
    Absolute(f64),
    /// 相对播放器宽或高的比例值 (0.0..=1.0)。
    Proportional(f64),
}

/// Bilibili mode 7 高级弹幕的载荷，描述一次 from → to 的单段动画。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiliPositionedPayload {
    /// 显示文本，换行已规范化为 `\n`。
    pub text: String,
    /// 起始 X 坐标。
    pub from_x: BiliCoordinate,
    /// 起始 Y 坐标。
    pub from_y: BiliCoordinate,
    /// 结束 X 坐标，缺省时与起始值相同。
    pub to_x: BiliCoordinate,
    /// 结束 Y 坐标，缺省时与起始值相同。
    pub to_y: BiliCoordinate,
    /// 起始不透明度 (0.0..=1.0)，缺省 1.0。
    pub from_alpha: f64,
    /// 结束不透明度，缺省与起始值相同。
    pub to_alpha: f64,
    /// 绕 Z 轴的旋转角度（度），缺省 0。
    pub rotate_z: f64,
    /// 绕 Y 轴的旋转角度（度），缺省 0。
    pub rotate_y: f64,
    /// 弹幕的总显示时长（秒），缺省 4500。
    pub lifetime: f64,
    /// 位移动画时长（毫秒），缺省为 `lifetime` 对应的毫秒数。
    pub duration: i64,
    /// 位移动画的起始延迟（毫秒），缺省 0。
    pub delay: i64,
    /// 自定义字体。
    pub fontface: Option<String>,
    /// 是否保留描边。上游只有字符串 `"false"` 会关闭描边。
    pub border: bool,
}

/// AcFun 高级弹幕的载荷：一个初始状态加一串增量关键帧。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcfunPositionedPayload {
    /// 显示文本，回车已规范化为 `\n`。
    pub text: String,
    /// ASS 对齐码 (`\an`)。7 为默认对齐，输出时省略。
    pub anchor: u8,
    /// 自定义字体。
    pub fontface: Option<String>,
    /// 是否加粗。
    pub bold: bool,
    /// 是否保留描边，缺省 true。
    pub border: bool,
    /// 初始 X 坐标，相对播放器宽度的千分比。
    pub x: i64,
    /// 初始 Y 坐标，相对播放器高度的千分比。
    pub y: i64,
    /// 初始横向缩放，缺省 1.0。
    pub scale_x: f64,
    /// 初始纵向缩放，缺省 1.0。
    pub scale_y: f64,
    /// 初始绕 Z 轴旋转角度（度），缺省 0。
    pub rotate_z: f64,
    /// 初始绕 Y 轴旋转角度（度），缺省 0。
    pub rotate_y: f64,
    /// 初始不透明度 (0.0..=1.0)，缺省 1.0。
    pub alpha: f64,
    /// 初始状态出现前的延迟（秒），缺省 0。
    pub delay: f64,
    /// 初始状态的保持时长（秒），缺省 3.0。
    pub hold: f64,
    /// 后续关键帧，每帧只覆盖其显式给出的字段，其余继承上一帧。
    pub actions: Vec<AcfunAction>,
}

/// AcFun 高级弹幕中的一个增量关键帧。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcfunAction {
    /// 本段动画的时长（秒），缺省 0。
    pub duration: f64,
    /// 目标 X 坐标（千分比）。
    pub x: Option<i64>,
    /// 目标 Y 坐标（千分比）。
    pub y: Option<i64>,
    /// 目标横向缩放。
    pub scale_x: Option<f64>,
    /// 目标纵向缩放。
    pub scale_y: Option<f64>,
    /// 目标颜色（24 位 RGB）。
    pub color: Option<u32>,
    /// 目标不透明度。
    pub alpha: Option<f64>,
    /// 目标绕 Z 轴旋转角度（度）。
    pub rotate_z: Option<f64>,
    /// 目标绕 Y 轴旋转角度（度）。
    pub rotate_y: Option<f64>,
}

/// 表示一条规范化后的弹幕。
///
/// 由解析器构造并排序，进入生成器后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// 弹幕在视频时间轴上的出现时刻（秒）。
    pub timestamp: f64,
    /// 在原始数据中的序号。出现时刻相同时用它保持稳定顺序。
    pub sequence: usize,
    /// 显示文本，内部换行有效。
    pub text: String,
    /// 显示方式。
    pub mode: CommentMode,
    /// 24 位 RGB 颜色。
    pub color: u32,
    /// 原始数据中的字号。
    pub user_size: f64,
    /// 按目标字号换算后的实际字号。
    pub rendered_size: f64,
    /// 文本块的像素高度（行数 × 字号）。
    pub block_height: f64,
    /// 估算的像素宽度（最长行的字符数 × 字号），仅用于滚动碰撞计算。
    pub pixel_width: f64,
}
