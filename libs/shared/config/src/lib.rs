use std::env;
use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveTime;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: String,
    pub supabase_jwt_secret: String,
    pub frontend_url: String,
    pub paypal_mode: String,
    /// Exchange rate used by the simulated PayPal checkout.
    pub cop_per_usd: f64,
    pub port: u16,

    // Scheduling
    pub slot_step_minutes: i64,
    pub default_opening_time: NaiveTime,
    pub default_closing_time: NaiveTime,
    pub clip_slots_to_window: bool,
    pub max_appointment_minutes: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_key: String::new(),
            supabase_jwt_secret: String::new(),
            frontend_url: "http://localhost:5173".to_string(),
            paypal_mode: "sandbox".to_string(),
            cop_per_usd: 4000.0,
            port: 3000,
            slot_step_minutes: 30,
            default_opening_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            default_closing_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            clip_slots_to_window: true,
            max_appointment_minutes: 240,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| {
                    warn!("FRONTEND_URL not set, using default");
                    defaults.frontend_url.clone()
                }),
            paypal_mode: env::var("PAYPAL_MODE").unwrap_or_else(|_| defaults.paypal_mode.clone()),
            cop_per_usd: parse_var("COP_PER_USD", defaults.cop_per_usd),
            port: parse_var("PORT", defaults.port),
            slot_step_minutes: parse_var("SLOT_STEP_MINUTES", defaults.slot_step_minutes),
            default_opening_time: parse_time_var("WORKING_HOURS_START", defaults.default_opening_time),
            default_closing_time: parse_time_var("WORKING_HOURS_END", defaults.default_closing_time),
            clip_slots_to_window: parse_var("CLIP_SLOTS_TO_WINDOW", defaults.clip_slots_to_window),
            max_appointment_minutes: parse_var("MAX_APPOINTMENT_MINUTES", defaults.max_appointment_minutes),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// True when the Supabase-backed stores can be used.
    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn parse_time_var(key: &str, default: NaiveTime) -> NaiveTime {
    match env::var(key) {
        Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M").unwrap_or_else(|_| {
            warn!("{} must be HH:MM, got '{}', using {}", key, raw, default.format("%H:%M"));
            default
        }),
        Err(_) => default,
    }
}
