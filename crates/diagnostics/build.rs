//! Build script for generating failure-reason tables at compile time.
//!
//! This script reads `spec/reasons.json` and generates Rust files:
//! - `generated_codes.rs`: public constants mapping reason constant names to their IDs
//! - `generated_explain.rs`: a match expression mapping IDs to their long descriptions
//! - `generated_summary.rs`: a match expression mapping IDs to their one-line summaries
//! - `generated_reason_codes.rs`: a match over `Reason` variants yielding their code

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    let spec_path = Path::new("spec/reasons.json");
    println!("cargo:rerun-if-changed={}", spec_path.display());

    let raw = fs::read_to_string(spec_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", spec_path.display()));

    let spec: serde_json::Value =
        serde_json::from_str(&raw).expect("failed to parse reasons.json as JSON");

    let reasons = spec["reasons"]
        .as_array()
        .expect("reasons.json: expected `reasons` array");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let out_path = Path::new(&out_dir);

    // ── Duplicate / validity checks ─────────────────────────────────────
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut seen_variants: HashSet<String> = HashSet::new();

    // ── generated_codes.rs ──────────────────────────────────────────────
    let mut codes = String::from("// Auto-generated from spec/reasons.json. DO NOT EDIT.\n\n");
    let mut explain = String::from("match id {\n");
    let mut summary_match = String::from("match id {\n");
    let mut reason_codes = String::from("match self {\n");

    for (i, entry) in reasons.iter().enumerate() {
        let id = entry["id"]
            .as_str()
            .unwrap_or_else(|| panic!("reasons[{i}] missing `id`"));
        let const_name = entry["constName"]
            .as_str()
            .unwrap_or_else(|| panic!("reasons[{i}] (id={id}) missing `constName`"));
        let variant = entry["reason"]
            .as_str()
            .unwrap_or_else(|| panic!("reasons[{i}] (id={id}) missing `reason`"));
        let summary = entry["summary"]
            .as_str()
            .unwrap_or_else(|| panic!("reasons[{i}] (id={id}) missing `summary`"));
        let description = entry["description"]
            .as_str()
            .unwrap_or_else(|| panic!("reasons[{i}] (id={id}) missing `description`"));

        assert!(
            !const_name.is_empty()
                && const_name
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
                && const_name.as_bytes()[0].is_ascii_uppercase(),
            "reasons[{i}] (id={id}): constName '{const_name}' is not a valid SCREAMING_SNAKE_CASE identifier"
        );
        assert!(
            !variant.is_empty()
                && variant.bytes().all(|b| b.is_ascii_alphanumeric())
                && variant.as_bytes()[0].is_ascii_uppercase(),
            "reasons[{i}] (id={id}): reason '{variant}' is not a valid variant name"
        );

        assert!(
            seen_ids.insert(id.to_string()),
            "reasons[{i}]: duplicate id '{id}'"
        );
        assert!(
            seen_names.insert(const_name.to_string()),
            "reasons[{i}] (id={id}): duplicate constName '{const_name}'"
        );
        assert!(
            seen_variants.insert(variant.to_string()),
            "reasons[{i}] (id={id}): duplicate reason '{variant}'"
        );

        codes.push_str(&format!("/// {summary}\n"));
        codes.push_str(&format!("pub const {const_name}: &str = \"{id}\";\n\n"));

        explain.push_str(&format!(
            "    \"{id}\" => Some(\"{}\"),\n",
            escape_rust_string_literal(description)
        ));
        summary_match.push_str(&format!(
            "    \"{id}\" => Some(\"{}\"),\n",
            escape_rust_string_literal(summary)
        ));
        reason_codes.push_str(&format!(
            "    Reason::{variant} => codes::{const_name},\n"
        ));
    }

    explain.push_str("    _ => None,\n}\n");
    summary_match.push_str("    _ => None,\n}\n");
    reason_codes.push_str("}\n");

    fs::write(out_path.join("generated_codes.rs"), &codes)
        .expect("failed to write generated_codes.rs");
    fs::write(out_path.join("generated_explain.rs"), &explain)
        .expect("failed to write generated_explain.rs");
    fs::write(out_path.join("generated_summary.rs"), &summary_match)
        .expect("failed to write generated_summary.rs");
    fs::write(out_path.join("generated_reason_codes.rs"), &reason_codes)
        .expect("failed to write generated_reason_codes.rs");
}

fn escape_rust_string_literal(value: &str) -> String {
    value.chars().flat_map(char::escape_default).collect()
}
