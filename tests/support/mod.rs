//! Fixtures shared by the integration tests: canned `dasgoclient` and CRIC
//! responses shaped like the real services' JSON.

use serde_json::{json, Value};

/// `dasgoclient --query "file dataset=..." --json` output.
#[allow(dead_code)]
pub fn das_files(files: &[(&str, bool)]) -> String {
    let records: Vec<Value> = files
        .iter()
        .map(|(name, valid)| {
            json!({
                "das": {"expire": 1700000000, "primary_key": "file.name"},
                "qhash": "0d8e2b0f",
                "file": [{
                    "name": name,
                    "is_file_valid": if *valid { 1 } else { 0 },
                    "size": 2048
                }]
            })
        })
        .collect();
    Value::Array(records).to_string()
}

/// `dasgoclient --query "lumi file=..." --json` output.
#[allow(dead_code)]
pub fn das_lumis(pairs: &[(u32, u32)]) -> String {
    let records: Vec<Value> = pairs
        .iter()
        .map(|(run, lumi)| {
            json!({
                "das": {"primary_key": "lumi.number"},
                "lumi": [{"run_number": run, "lumi_section_num": lumi, "event_count": 100}]
            })
        })
        .collect();
    Value::Array(records).to_string()
}

/// CRIC `whoami` response for `login`.
#[allow(dead_code)]
pub fn cric_whoami(login: &str) -> String {
    json!({
        "result": [{
            "login": login,
            "dn": "/DC=ch/DC=cern/OU=Users/CN=test",
            "roles": {}
        }]
    })
    .to_string()
}
