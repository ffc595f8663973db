use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub viewport_width: f64,
    pub tap_epsilon_px: f64,
    pub swipe_threshold_ratio: f64,
    pub drag_rotation_divisor: f64,
    pub exit_rotation_deg: f64,
    pub exit_animation_ms: u64,
    pub long_press_ms: u64,
    pub overlay_transition_ms: u64,
    pub gallery_default_columns: u8,
    pub gallery_max_columns: u8,
    pub password_hash_cost: u32,
    pub storage_bucket: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            viewport_width: 1000.0,
            tap_epsilon_px: 5.0,
            swipe_threshold_ratio: 0.25,
            drag_rotation_divisor: 20.0,
            exit_rotation_deg: 45.0,
            exit_animation_ms: 300,
            long_press_ms: 500,
            overlay_transition_ms: 300,
            gallery_default_columns: 3,
            gallery_max_columns: 6,
            password_hash_cost: 10,
            storage_bucket: "flashdeck".to_string(),
        }
    }
}

// 缺省或无法解析时回退到默认值
fn var_or<T: FromStr>(key: &str, fallback: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {:?}, using default", key, raw);
            fallback
        }),
        Err(_) => fallback,
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let defaults = Config::default();
        let gallery_max_columns = var_or("GALLERY_MAX_COLUMNS", defaults.gallery_max_columns).max(1);
        Config {
            viewport_width: var_or("VIEWPORT_WIDTH", defaults.viewport_width),
            tap_epsilon_px: var_or("TAP_EPSILON_PX", defaults.tap_epsilon_px),
            swipe_threshold_ratio: var_or("SWIPE_THRESHOLD_RATIO", defaults.swipe_threshold_ratio),
            drag_rotation_divisor: var_or("DRAG_ROTATION_DIVISOR", defaults.drag_rotation_divisor),
            exit_rotation_deg: var_or("EXIT_ROTATION_DEG", defaults.exit_rotation_deg),
            exit_animation_ms: var_or("EXIT_ANIMATION_MS", defaults.exit_animation_ms),
            long_press_ms: var_or("LONG_PRESS_MS", defaults.long_press_ms),
            overlay_transition_ms: var_or("OVERLAY_TRANSITION_MS", defaults.overlay_transition_ms),
            gallery_default_columns: var_or("GALLERY_DEFAULT_COLUMNS", defaults.gallery_default_columns)
                .clamp(1, gallery_max_columns),
            gallery_max_columns,
            // bcrypt 接受的代价范围是 4..=31
            password_hash_cost: var_or("PASSWORD_HASH_COST", defaults.password_hash_cost).clamp(4, 31),
            storage_bucket: env::var("STORAGE_BUCKET").unwrap_or(defaults.storage_bucket),
        }
    }

    pub fn exit_animation(&self) -> Duration {
        Duration::from_millis(self.exit_animation_ms)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn overlay_transition(&self) -> Duration {
        Duration::from_millis(self.overlay_transition_ms)
    }

    /// 水平拖动距离超过该值才算作滑动
    pub fn swipe_threshold(&self, viewport_width: f64) -> f64 {
        viewport_width * self.swipe_threshold_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_quarter_of_viewport_by_default() {
        let config = Config::default();
        assert_eq!(config.swipe_threshold(1000.0), 250.0);
        assert_eq!(config.exit_animation(), Duration::from_millis(300));
        assert_eq!(config.long_press(), Duration::from_millis(500));
    }
}
