//! Change-pattern classification rules.
//!
//! Pure functions, no I/O. Every (component, method) pair maps to exactly one
//! (priority, category) pair; the rules are evaluated top to bottom and the
//! first match wins, with Medium/Integration as the fallback.

use crate::models::{ChangedComponent, MethodChange, TestCategory, TestPriority};

const CRITICAL_KEYWORDS: &[&str] = &[
    "security",
    "auth",
    "token",
    "login",
    "password",
    "credential",
    "permission",
    "encrypt",
    "payment",
    "billing",
    "financial",
    "transaction",
    "integrity",
];

const HIGH_KEYWORDS: &[&str] = &[
    "business",
    "core",
    "api",
    "contract",
    "endpoint",
    "schema",
    "migration",
    "user-facing",
    "workflow",
    "order",
];

const MEDIUM_KEYWORDS: &[&str] = &[
    "feature",
    "enhancement",
    "performance",
    "optimiz",
    "ui",
    "ux",
    "style",
    "layout",
];

const LOW_KEYWORDS: &[&str] = &[
    "refactor", "rename", "doc", "comment", "log", "format", "cleanup", "typo",
];

const UI_PATH_MARKERS: &[&str] = &[
    "component", "page", "view", "screen", "ui/", "frontend", ".tsx", ".jsx", ".vue", ".html",
    ".css",
];

const API_PATH_MARKERS: &[&str] = &[
    "controller",
    "service",
    "api",
    "handler",
    "endpoint",
    "repository",
    "route",
];

const BACKEND_EXTENSIONS: &[&str] = &[
    ".py", ".cs", ".java", ".rb", ".go", ".rs", ".php", ".kt", ".scala", ".ts", ".js",
];

/// Assign priority and category to a method change within a component.
/// Total: always returns exactly one pair.
pub fn classify(component: &ChangedComponent, method: &MethodChange) -> (TestPriority, TestCategory) {
    (priority_for(method), category_for(component))
}

/// Priority from keyword rules over the method name and summary.
pub fn priority_for(method: &MethodChange) -> TestPriority {
    let haystack = format!("{} {}", method.name, method.summary).to_lowercase();

    if contains_any(&haystack, CRITICAL_KEYWORDS) {
        TestPriority::Critical
    } else if contains_any(&haystack, HIGH_KEYWORDS) {
        TestPriority::High
    } else if contains_any(&haystack, MEDIUM_KEYWORDS) {
        TestPriority::Medium
    } else if contains_any(&haystack, LOW_KEYWORDS) {
        TestPriority::Low
    } else {
        TestPriority::Medium
    }
}

/// Category from the component's path or explicit UI flag. UI components map
/// to UI, recognizable backend source files to API, and everything else to
/// Integration.
pub fn category_for(component: &ChangedComponent) -> TestCategory {
    if is_ui_component(component) {
        return TestCategory::Ui;
    }

    let path = component.file_path.to_lowercase();
    if contains_any(&path, API_PATH_MARKERS)
        || BACKEND_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    {
        TestCategory::Api
    } else {
        TestCategory::Integration
    }
}

/// Whether a component is UI-facing, by explicit flag or path heuristic.
pub fn is_ui_component(component: &ChangedComponent) -> bool {
    if component.ui_component {
        return true;
    }
    let path = component.file_path.to_lowercase();
    contains_any(&path, UI_PATH_MARKERS)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
