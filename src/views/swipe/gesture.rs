use crate::config::Config;
use crate::ui::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

/// 当前卡片的拖动状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragPhase {
    Idle,
    Dragging { start_x: f64, current_x: f64 },
    /// 退场动画进行中，忽略一切输入
    Animating,
    Completed,
}

impl DragPhase {
    pub fn delta(&self) -> Option<f64> {
        match *self {
            DragPhase::Dragging { start_x, current_x } => Some(current_x - start_x),
            _ => None,
        }
    }

    /// 本张卡片是否还能被判定
    pub fn accepts_action(&self) -> bool {
        matches!(self, DragPhase::Idle | DragPhase::Dragging { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// 位移小于点击阈值，翻面
    Tap,
    SnapBack,
    Swipe(SwipeDirection),
}

/// 松手时根据水平位移判定手势；点击判定优先于滑动判定
pub fn classify_release(delta: f64, viewport_width: f64, config: &Config) -> Release {
    if delta.abs() < config.tap_epsilon_px {
        return Release::Tap;
    }
    let threshold = config.swipe_threshold(viewport_width);
    if delta > threshold {
        Release::Swipe(SwipeDirection::Right)
    } else if delta < -threshold {
        Release::Swipe(SwipeDirection::Left)
    } else {
        Release::SnapBack
    }
}

pub fn drag_transform(delta: f64, config: &Config) -> Transform {
    Transform {
        translate_x: delta,
        rotate_deg: delta / config.drag_rotation_divisor,
        animated: false,
    }
}

pub fn exit_transform(direction: SwipeDirection, viewport_width: f64, config: &Config) -> Transform {
    let sign = match direction {
        SwipeDirection::Right => 1.0,
        SwipeDirection::Left => -1.0,
    };
    Transform {
        translate_x: sign * viewport_width,
        rotate_deg: sign * config.exit_rotation_deg,
        animated: true,
    }
}

pub fn rest_transform() -> Transform {
    Transform {
        animated: true,
        ..Transform::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_is_classified_against_quarter_width() {
        let config = Config::default();
        assert_eq!(
            classify_release(300.0, 1000.0, &config),
            Release::Swipe(SwipeDirection::Right)
        );
        assert_eq!(
            classify_release(-300.0, 1000.0, &config),
            Release::Swipe(SwipeDirection::Left)
        );
        assert_eq!(classify_release(100.0, 1000.0, &config), Release::SnapBack);
        assert_eq!(classify_release(-250.0, 1000.0, &config), Release::SnapBack);
        assert_eq!(classify_release(250.5, 1000.0, &config), Release::Swipe(SwipeDirection::Right));
    }

    #[test]
    fn small_movement_is_a_tap() {
        let config = Config::default();
        for delta in [0.0, 4.9, -4.9, 3.0] {
            assert_eq!(classify_release(delta, 1000.0, &config), Release::Tap);
        }
        assert_eq!(classify_release(5.0, 1000.0, &config), Release::SnapBack);
        // 视口极窄时点击仍优先
        assert_eq!(classify_release(4.0, 8.0, &config), Release::Tap);
    }

    #[test]
    fn transforms_follow_delta_and_direction() {
        let config = Config::default();
        let drag = drag_transform(-120.0, &config);
        assert_eq!(drag.translate_x, -120.0);
        assert_eq!(drag.rotate_deg, -6.0);
        assert!(!drag.animated);

        let exit = exit_transform(SwipeDirection::Left, 800.0, &config);
        assert_eq!(exit.translate_x, -800.0);
        assert_eq!(exit.rotate_deg, -45.0);
        assert!(exit.animated);
    }

    #[test]
    fn only_idle_or_dragging_accepts_actions() {
        assert!(DragPhase::Idle.accepts_action());
        assert!(
            DragPhase::Dragging {
                start_x: 0.0,
                current_x: 10.0
            }
            .accepts_action()
        );
        assert!(!DragPhase::Animating.accepts_action());
        assert!(!DragPhase::Completed.accepts_action());
        assert_eq!(
            DragPhase::Dragging {
                start_x: 10.0,
                current_x: 4.0
            }
            .delta(),
            Some(-6.0)
        );
    }
}
