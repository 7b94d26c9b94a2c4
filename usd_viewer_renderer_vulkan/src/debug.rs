/// Vulkan debug messenger - routes validation layer messages to the viewer log
///
/// Only compiled with the `vulkan-validation` feature. Messages are counted
/// per severity and identical messages are grouped with a repeat counter.

use ash::vk;
use rustc_hash::FxHashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use usd_viewer::log::{self, LogSeverity};

const SOURCE: &str = "usd_viewer::vulkan::validation";

static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

static MESSAGE_COUNTS: Mutex<Option<FxHashMap<String, u32>>> = Mutex::new(None);

/// Validation message counts since the messenger was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info
    }
}

struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
        }
    }

    fn record(&self, severity: LogSeverity) {
        let counter = match severity {
            LogSeverity::Error => &self.errors,
            LogSeverity::Warn => &self.warnings,
            _ => &self.info,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
    }
}

pub fn validation_stats() -> ValidationStats {
    VALIDATION_STATS.get()
}

pub(crate) fn reset_validation_stats() {
    VALIDATION_STATS.reset();
    if let Ok(mut counts) = MESSAGE_COUNTS.lock() {
        *counts = Some(FxHashMap::default());
    }
}

/// Log the totals when any validation message was seen.
pub(crate) fn log_validation_summary() {
    let stats = validation_stats();
    if stats.total() == 0 {
        log::log(LogSeverity::Debug, SOURCE, "No validation messages".to_string());
        return;
    }
    let severity = if stats.errors > 0 { LogSeverity::Warn } else { LogSeverity::Info };
    log::log(
        severity,
        SOURCE,
        format!(
            "Validation summary: {} errors, {} warnings, {} info",
            stats.errors, stats.warnings, stats.info
        ),
    );
}

/// Viewer log severity of a validation message.
pub fn message_severity(flags: vk::DebugUtilsMessageSeverityFlagsEXT) -> LogSeverity {
    if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        LogSeverity::Error
    } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        LogSeverity::Warn
    } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        LogSeverity::Debug
    } else {
        LogSeverity::Trace
    }
}

pub fn message_type_name(flags: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if flags.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if flags.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

/// How many times `message` has been seen, this one included.
fn track_message(message: &str) -> u32 {
    let Ok(mut guard) = MESSAGE_COUNTS.lock() else {
        return 1;
    };
    let counts = guard.get_or_insert_with(FxHashMap::default);
    let count = counts.entry(message.to_string()).or_insert(0);
    *count += 1;
    *count
}

unsafe fn c_str_or<'a>(ptr: *const std::os::raw::c_char, fallback: &'a str) -> std::borrow::Cow<'a, str> {
    if ptr.is_null() {
        fallback.into()
    } else {
        CStr::from_ptr(ptr).to_string_lossy()
    }
}

/// Vulkan debug messenger callback.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity_flags: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = &*p_callback_data;
    let message_id_name = c_str_or(callback_data.p_message_id_name, "Unknown");
    let message = c_str_or(callback_data.p_message, "No message");

    let severity = message_severity(message_severity_flags);
    VALIDATION_STATS.record(severity);

    let occurrences = track_message(&message);
    let repeat = if occurrences > 1 {
        format!(" [x{}]", occurrences)
    } else {
        String::new()
    };

    log::log(
        severity,
        SOURCE,
        format!(
            "[{}]{} {}: {}",
            message_type_name(message_type),
            repeat,
            message_id_name,
            message
        ),
    );

    vk::FALSE
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
