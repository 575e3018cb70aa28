use crate::domain::model::TargetBox;

/// 計算輸出尺寸
///
/// 等比例時縮到剛好放進外框（只縮不放大）；不等比例時直接使用指定尺寸，
/// 缺少的邊沿用原圖。回傳的邊長至少為 1。
pub fn fit_dimensions(source: (u32, u32), target: TargetBox, preserve_aspect: bool) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 || target.is_unbounded() {
        return source;
    }

    if !preserve_aspect {
        return (
            target.width.unwrap_or(src_w).max(1),
            target.height.unwrap_or(src_h).max(1),
        );
    }

    let ratio_w = target.width.map(|w| f64::from(w) / f64::from(src_w));
    let ratio_h = target.height.map(|h| f64::from(h) / f64::from(src_h));
    let ratio = match (ratio_w, ratio_h) {
        (Some(rw), Some(rh)) => rw.min(rh),
        (Some(r), None) | (None, Some(r)) => r,
        (None, None) => return source,
    };

    if ratio >= 1.0 {
        return source;
    }

    let scale = |side: u32, bound: Option<u32>| -> u32 {
        let scaled = (f64::from(side) * ratio).round() as u32;
        scaled.clamp(1, bound.unwrap_or(u32::MAX))
    };

    (scale(src_w, target.width), scale(src_h, target.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded(w: u32, h: u32) -> TargetBox {
        TargetBox::new(Some(w), Some(h))
    }

    #[test]
    fn test_landscape_into_hd_is_height_bound() {
        assert_eq!(fit_dimensions((4000, 3000), bounded(1280, 720), true), (960, 720));
    }

    #[test]
    fn test_wide_panorama_is_width_bound() {
        assert_eq!(fit_dimensions((6000, 1000), bounded(1920, 1080), true), (1920, 320));
    }

    #[test]
    fn test_portrait_into_4k() {
        assert_eq!(fit_dimensions((3000, 6000), bounded(3840, 2160), true), (1080, 2160));
    }

    #[test]
    fn test_small_image_is_not_enlarged() {
        assert_eq!(fit_dimensions((800, 600), bounded(1280, 720), true), (800, 600));
        assert_eq!(fit_dimensions((1280, 720), bounded(1280, 720), true), (1280, 720));
    }

    #[test]
    fn test_single_side_follows_aspect_ratio() {
        assert_eq!(fit_dimensions((2000, 1000), TargetBox::new(Some(500), None), true), (500, 250));
        assert_eq!(fit_dimensions((2000, 1000), TargetBox::new(None, Some(100)), true), (200, 100));
    }

    #[test]
    fn test_stretch_uses_exact_dimensions() {
        assert_eq!(fit_dimensions((2000, 1000), bounded(300, 300), false), (300, 300));
        assert_eq!(fit_dimensions((2000, 1000), TargetBox::new(Some(300), None), false), (300, 1000));
    }

    #[test]
    fn test_extreme_aspect_never_collapses_to_zero() {
        let (w, h) = fit_dimensions((10000, 1), bounded(1280, 720), true);
        assert_eq!(w, 1280);
        assert_eq!(h, 1);
    }

    #[test]
    fn test_result_always_inside_box_and_keeps_ratio() {
        let boxes = [bounded(1280, 720), bounded(1920, 1080), bounded(3840, 2160)];
        let sources = [(4000, 3000), (1921, 1081), (5000, 5000), (7777, 1234), (1234, 7777)];

        for target in boxes {
            for (sw, sh) in sources {
                let (tw, th) = (target.width.unwrap(), target.height.unwrap());
                let (w, h) = fit_dimensions((sw, sh), target, true);
                assert!(w <= tw && h <= th);

                let ratio = (f64::from(tw) / f64::from(sw))
                    .min(f64::from(th) / f64::from(sh))
                    .min(1.0);
                assert!((f64::from(w) - f64::from(sw) * ratio).abs() <= 1.0, "{sw}x{sh} -> {w}x{h}");
                assert!((f64::from(h) - f64::from(sh) * ratio).abs() <= 1.0, "{sw}x{sh} -> {w}x{h}");
            }
        }
    }
}
