//! 旧版播放器虚拟坐标系到目标画布的几何变换。

use std::collections::HashMap;

use tracing::error;

/// Bilibili 旧版播放器（2014 版）的虚拟尺寸。
pub(super) const BILI_PLAYER_SIZE: (u32, u32) = (672, 438);
/// AcFun 旧版播放器的虚拟尺寸。
pub(super) const ACFUN_PLAYER_SIZE: (u32, u32) = (560, 400);

/// 虚拟播放器坐标到目标画布的线性映射：`new = scale * old + offset`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct ZoomFactor {
    /// 统一缩放系数。
    pub scale: f64,
    /// X 方向平移。
    pub offset_x: f64,
    /// Y 方向平移。
    pub offset_y: f64,
}

impl ZoomFactor {
    const IDENTITY: Self = Self {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };
}

/// 计算保持宽高比地把虚拟播放器内嵌到目标画布的缩放与平移。
///
/// 高度为 0 导致宽高比无法计算时退化为恒等映射。
pub(super) fn zoom_factor(source: (u32, u32), target: (u32, u32)) -> ZoomFactor {
    let (sw, sh) = (f64::from(source.0), f64::from(source.1));
    let (tw, th) = (f64::from(target.0), f64::from(target.1));
    if sh == 0.0 || th == 0.0 {
        return ZoomFactor::IDENTITY;
    }
    let source_aspect = sw / sh;
    let target_aspect = tw / th;
    if target_aspect < source_aspect {
        // 目标相对更窄，按宽度缩放，上下留边
        ZoomFactor {
            scale: tw / sw,
            offset_x: 0.0,
            offset_y: (th - tw / source_aspect) / 2.0,
        }
    } else if target_aspect > source_aspect {
        // 目标相对更宽，按高度缩放，左右留边
        ZoomFactor {
            scale: th / sh,
            offset_x: (tw - th * source_aspect) / 2.0,
            offset_y: 0.0,
        }
    } else if sw == 0.0 {
        ZoomFactor::IDENTITY
    } else {
        ZoomFactor {
            scale: tw / sw,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// 以（虚拟尺寸, 目标尺寸）为键的缩放参数缓存。
///
/// 一次转换内输入不变，算过的组合直接复用，不需要失效逻辑。
#[derive(Debug, Default)]
pub(super) struct ZoomFactorCache {
    entries: HashMap<((u32, u32), (u32, u32)), ZoomFactor>,
}

impl ZoomFactorCache {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn get(&mut self, source: (u32, u32), target: (u32, u32)) -> ZoomFactor {
        *self
            .entries
            .entry((source, target))
            .or_insert_with(|| zoom_factor(source, target))
    }
}

/// 三轴旋转加透视投影的结果。
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct FlashRotation {
    /// 投影后的 X 坐标。
    pub x: f64,
    /// 投影后的 Y 坐标。
    pub y: f64,
    /// 输出的绕 X 轴旋转角度（度）。
    pub rot_x: f64,
    /// 输出的绕 Y 轴旋转角度（度）。
    pub rot_y: f64,
    /// 输出的绕 Z 轴旋转角度（度）。
    pub rot_z: f64,
    /// 横向缩放（百分比）。
    pub scale_x: f64,
    /// 纵向缩放（百分比）。
    pub scale_y: f64,
}

/// 把角度规范化到 (-180, 180]。
pub(super) fn wrap_angle(degrees: f64) -> f64 {
    180.0 - (180.0 - degrees).rem_euclid(360.0)
}

/// 模拟旧版 Flash 播放器绕 Y/Z 轴的旋转与透视投影。
///
/// FOV 取 `width * tan(40°) / 2`，对应旧版渲染器约 100° 水平视场的假设。
/// Y 轴旋转恰好为 ±90° 时偏转 1° 避开投影奇点；对象落到摄像机之后时
/// 翻转缩放并把 X/Y 旋转加 180°，记录日志但不中断。
pub(super) fn convert_flash_rotation(
    rot_y: f64,
    rot_z: f64,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> FlashRotation {
    let mut rot_y = wrap_angle(rot_y);
    let rot_z = wrap_angle(rot_z);
    if rot_y == 90.0 || rot_y == -90.0 {
        rot_y -= 1.0;
    }
    let (mut out_x, mut out_y, out_z, ry, rz) = if rot_y == 0.0 || rot_z == 0.0 {
        // Flash 中的正角度表示顺时针，ASS 相反
        (
            0.0,
            -rot_y,
            -rot_z,
            rot_y.to_radians(),
            rot_z.to_radians(),
        )
    } else {
        let ry = rot_y.to_radians();
        let rz = rot_z.to_radians();
        (
            (ry.sin() * rz.sin()).asin().to_degrees(),
            (-ry.sin() * rz.cos()).atan2(ry.cos()).to_degrees(),
            (-ry.cos() * rz.sin()).atan2(rz.cos()).to_degrees(),
            ry,
            rz,
        )
    };
    let mut tr_x = (x * rz.cos() + y * rz.sin()) / ry.cos()
        + (1.0 - rz.cos() / ry.cos()) * width / 2.0
        - rz.sin() / ry.cos() * height / 2.0;
    let mut tr_y =
        y * rz.cos() - x * rz.sin() + rz.sin() * width / 2.0 + (1.0 - rz.cos()) * height / 2.0;
    let tr_z = (tr_x - width / 2.0) * ry.sin();
    let fov = width * (2.0 * std::f64::consts::PI / 9.0).tan() / 2.0;
    let mut scale_xy = if fov + tr_z == 0.0 {
        error!("旋转使对象落在摄像机平面上: trZ = {tr_z:.0}");
        1.0
    } else {
        fov / (fov + tr_z)
    };
    tr_x = (tr_x - width / 2.0) * scale_xy + width / 2.0;
    tr_y = (tr_y - height / 2.0) * scale_xy + height / 2.0;
    if scale_xy < 0.0 {
        error!("旋转使对象位于摄像机之后: trZ = {tr_z:.0}, FOV = {fov:.0}");
        scale_xy = -scale_xy;
        out_x += 180.0;
        out_y += 180.0;
    }
    FlashRotation {
        x: tr_x,
        y: tr_y,
        rot_x: wrap_angle(out_x),
        rot_y: wrap_angle(out_y),
        rot_z: wrap_angle(out_z),
        scale_x: scale_xy * 100.0,
        scale_y: scale_xy * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_angle_maps_into_half_open_range() {
        assert_eq!(wrap_angle(0.0), 0.0);
        assert_eq!(wrap_angle(180.0), 180.0);
        assert_eq!(wrap_angle(-180.0), 180.0);
        assert_eq!(wrap_angle(270.0), -90.0);
        assert_eq!(wrap_angle(540.0), 180.0);
        assert_eq!(wrap_angle(-450.0), -90.0);
    }

    #[test]
    fn zoom_keeps_equal_aspect_centered() {
        let zoom = zoom_factor((1280, 720), (1920, 1080));
        assert_eq!(zoom.scale, 1.5);
        assert_eq!(zoom.offset_x, 0.0);
        assert_eq!(zoom.offset_y, 0.0);
    }

    #[test]
    fn zoom_pillarboxes_wider_target() {
        let zoom = zoom_factor(BILI_PLAYER_SIZE, (1920, 1080));
        assert!((zoom.scale - 1080.0 / 438.0).abs() < 1e-12);
        assert!(zoom.offset_x > 0.0);
        assert_eq!(zoom.offset_y, 0.0);
    }

    #[test]
    fn zoom_is_symmetric_under_axis_swap() {
        let landscape = zoom_factor((672, 438), (1920, 1080));
        let portrait = zoom_factor((438, 672), (1080, 1920));
        assert!((landscape.scale - portrait.scale).abs() < 1e-12);
        assert!((landscape.offset_x - portrait.offset_y).abs() < 1e-12);
        assert!((landscape.offset_y - portrait.offset_x).abs() < 1e-12);
    }

    #[test]
    fn zoom_degenerates_to_identity_on_zero_height() {
        let zoom = zoom_factor((672, 0), (1920, 1080));
        assert_eq!(zoom, ZoomFactor::IDENTITY);
        let zoom = zoom_factor((672, 438), (1920, 0));
        assert_eq!(zoom, ZoomFactor::IDENTITY);
    }

    #[test]
    fn zoom_cache_returns_consistent_values() {
        let mut cache = ZoomFactorCache::new();
        let first = cache.get(BILI_PLAYER_SIZE, (1920, 1080));
        let second = cache.get(BILI_PLAYER_SIZE, (1920, 1080));
        assert_eq!(first, second);
        assert_eq!(first, zoom_factor(BILI_PLAYER_SIZE, (1920, 1080)));
    }

    #[test]
    fn rotation_without_angles_is_identity() {
        let rot = convert_flash_rotation(0.0, 0.0, 100.0, 200.0, 1280.0, 720.0);
        assert!((rot.x - 100.0).abs() < 1e-9);
        assert!((rot.y - 200.0).abs() < 1e-9);
        assert_eq!(rot.rot_x, 0.0);
        assert_eq!(rot.rot_y, 0.0);
        assert_eq!(rot.rot_z, 0.0);
        assert!((rot.scale_x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn rotation_at_ninety_degrees_is_nudged_and_finite() {
        let rot = convert_flash_rotation(90.0, 0.0, 640.0, 360.0, 1280.0, 720.0);
        assert!(rot.x.is_finite());
        assert!(rot.y.is_finite());
        assert!(rot.scale_x.is_finite());
        assert_eq!(rot.rot_y, -89.0);
        assert!((rot.x - 640.0).abs() < 1e-6);
        assert!((rot.y - 360.0).abs() < 1e-6);
    }

    #[test]
    fn rotation_behind_camera_flips_back_to_front() {
        let rot = convert_flash_rotation(90.0, 0.0, 100.0, 100.0, 1280.0, 720.0);
        assert!(rot.scale_x.is_finite());
        assert!(rot.scale_x > 0.0);
        assert_eq!(rot.rot_x, 180.0);
        assert_eq!(rot.rot_y, 91.0);
    }

    #[test]
    fn rotation_only_around_z_counter_rotates_output() {
        let rot = convert_flash_rotation(0.0, 30.0, 0.0, 0.0, 1280.0, 720.0);
        assert_eq!(rot.rot_x, 0.0);
        assert_eq!(rot.rot_y, 0.0);
        assert_eq!(rot.rot_z, -30.0);
    }
}
