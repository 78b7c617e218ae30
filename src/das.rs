//! Dataset bookkeeping queries through `dasgoclient`.
//!
//! `dasgoclient` translates a DAS query into JSON on stdout. Every response
//! is a list of records, and each record wraps the payload in a
//! single-element list under a key named after the queried entity:
//!
//! ```text
//! [{"das": {...}, "qhash": "...", "file": [{"name": "/store/...", "is_file_valid": 1, ...}]}]
//! [{"das": {...}, "qhash": "...", "lumi": [{"run_number": 1, "lumi_section_num": 10, ...}]}]
//! ```
//!
//! The combined `file,run,lumi` query would answer in one call, but it
//! reports runs and lumis as two uncorrelated lists per file, so lumis are
//! fetched per file with `lumi file=...` instead.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::diagnostics;
use crate::errors::ClientError;
use crate::exec::{CommandRunner, ExternalCommand};
use crate::lumi_list::LumiList;

pub const DEFAULT_DBS_INSTANCE: &str = "phys03";

#[derive(Debug, Deserialize)]
struct FileRecord {
    file: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    name: String,
    #[serde(deserialize_with = "truthy")]
    is_file_valid: bool,
}

#[derive(Debug, Deserialize)]
struct LumiRecord {
    lumi: Vec<LumiEntry>,
}

#[derive(Debug, Deserialize)]
struct LumiEntry {
    run_number: u32,
    lumi_section_num: u32,
}

/// DBS reports validity as `1`/`0` or as a boolean depending on the instance.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}

/// Parsed records of one query, with what is needed to report on them.
struct QueryResponse<T> {
    command_line: String,
    records: Vec<T>,
    stdout: String,
}

/// Query client bound to one DBS instance.
pub struct DasClient<'a> {
    runner: &'a dyn CommandRunner,
    program: String,
    instance: String,
}

impl<'a> DasClient<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &Config) -> Self {
        Self {
            runner,
            program: config.das_client.clone(),
            instance: config.dbs_instance.clone(),
        }
    }

    /// Query another DBS instance, e.g. `global`.
    pub fn with_instance(mut self, instance: &str) -> Self {
        self.instance = instance.to_string();
        self
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn command_for(&self, query: &str) -> ExternalCommand {
        ExternalCommand::new(&self.program)
            .arg("--query")
            .arg(format!("{} instance=prod/{}", query, self.instance))
            .arg("--json")
    }

    fn run_query<T: DeserializeOwned>(&self, query: &str) -> Result<QueryResponse<T>, ClientError> {
        let command = self.command_for(query);
        debug!("Querying DAS: {}", command);

        let output = self.runner.run(&command).map_err(|err| {
            ClientError::Client(diagnostics::command_failed(
                &command.command_line(),
                "unknown",
                "",
                &err.to_string(),
            ))
        })?;

        if !output.success() || output.stdout.is_empty() {
            return Err(ClientError::Client(diagnostics::command_failed(
                &command.command_line(),
                &output.exit_code_display(),
                &output.stdout,
                &output.stderr,
            )));
        }

        let records: Vec<T> = serde_json::from_str(&output.stdout).map_err(|e| {
            ClientError::Client(diagnostics::unexpected_output(
                &command.command_line(),
                &e.to_string(),
                &output.stdout,
            ))
        })?;

        Ok(QueryResponse {
            command_line: command.command_line(),
            records,
            stdout: output.stdout,
        })
    }

    /// Names of the files of `dataset` flagged valid, in response order.
    pub fn valid_files(&self, dataset: &str) -> Result<Vec<String>, ClientError> {
        let response = self.run_query::<FileRecord>(&format!("file dataset={}", dataset))?;

        let mut valid = Vec::new();
        for (idx, record) in response.records.into_iter().enumerate() {
            let file = record.file.into_iter().next().ok_or_else(|| {
                ClientError::Client(diagnostics::unexpected_output(
                    &response.command_line,
                    &format!("record {} has an empty 'file' list", idx),
                    &response.stdout,
                ))
            })?;
            if file.is_file_valid {
                valid.push(file.name);
            }
        }

        debug!("{} valid files in {}", valid.len(), dataset);
        Ok(valid)
    }

    /// (run, lumi) pairs of one file, in response order.
    pub fn file_lumis(&self, file: &str) -> Result<Vec<(u32, u32)>, ClientError> {
        let response = self.run_query::<LumiRecord>(&format!("lumi file={}", file))?;
        let QueryResponse {
            command_line,
            records,
            stdout,
        } = response;

        records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| {
                record
                    .lumi
                    .into_iter()
                    .next()
                    .map(|entry| (entry.run_number, entry.lumi_section_num))
                    .ok_or_else(|| {
                        ClientError::Client(diagnostics::unexpected_output(
                            &command_line,
                            &format!("record {} has an empty 'lumi' list", idx),
                            &stdout,
                        ))
                    })
            })
            .collect()
    }

    /// Every (run, lumi) pair of every valid file, in response order,
    /// without deduplication.
    ///
    /// Stops at the first failing query; no partial result is returned.
    pub fn valid_run_lumi_pairs(&self, dataset: &str) -> Result<Vec<(u32, u32)>, ClientError> {
        let mut pairs = Vec::new();
        for file in self.valid_files(dataset)? {
            pairs.extend(self.file_lumis(&file)?);
        }
        Ok(pairs)
    }

    /// Runs and lumis in the valid files of `dataset`.
    ///
    /// A dataset without valid files yields an empty list.
    pub fn lumi_list_in_valid_files(&self, dataset: &str) -> Result<LumiList, ClientError> {
        let pairs = self.valid_run_lumi_pairs(dataset)?;
        debug!("{} run/lumi pairs collected for {}", pairs.len(), dataset);
        Ok(LumiList::from_pairs(pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ScriptedRunner;

    fn file_json(files: &[(&str, Value)]) -> String {
        let records: Vec<Value> = files
            .iter()
            .map(|(name, valid)| {
                serde_json::json!({
                    "das": {"services": ["dbs3:files"]},
                    "qhash": "abc",
                    "file": [{"name": name, "is_file_valid": valid, "size": 1024}]
                })
            })
            .collect();
        Value::Array(records).to_string()
    }

    fn lumi_json(pairs: &[(u32, u32)]) -> String {
        let records: Vec<Value> = pairs
            .iter()
            .map(|(run, lumi)| {
                serde_json::json!({
                    "das": {},
                    "qhash": "def",
                    "lumi": [{"run_number": run, "lumi_section_num": lumi, "run.run_number": 0}]
                })
            })
            .collect();
        Value::Array(records).to_string()
    }

    #[test]
    fn test_command_for_uses_instance() {
        let runner = ScriptedRunner::new();
        let das = DasClient::new(&runner, &Config::default()).with_instance("global");
        let cmd = das.command_for("file dataset=/A/B/C");
        assert_eq!(cmd.program, "dasgoclient");
        assert_eq!(
            cmd.args,
            vec!["--query", "file dataset=/A/B/C instance=prod/global", "--json"]
        );
        assert_eq!(das.instance(), "global");
    }

    #[test]
    fn test_valid_files_accepts_numeric_and_boolean_flags() {
        let runner = ScriptedRunner::new();
        runner
            .expect("dasgoclient")
            .matching("file dataset=/A/B/C")
            .stdout(&file_json(&[
                ("/store/a.root", serde_json::json!(1)),
                ("/store/b.root", serde_json::json!(0)),
                ("/store/c.root", serde_json::json!(true)),
                ("/store/d.root", serde_json::json!(false)),
            ]))
            .finish();

        let files = DasClient::new(&runner, &Config::default())
            .valid_files("/A/B/C")
            .unwrap();
        assert_eq!(files, vec!["/store/a.root", "/store/c.root"]);
    }

    #[test]
    fn test_file_lumis_preserves_order_and_duplicates() {
        let runner = ScriptedRunner::new();
        runner
            .expect("dasgoclient")
            .stdout(&lumi_json(&[(2, 5), (1, 11), (1, 11)]))
            .finish();

        let pairs = DasClient::new(&runner, &Config::default())
            .file_lumis("/store/a.root")
            .unwrap();
        assert_eq!(pairs, vec![(2, 5), (1, 11), (1, 11)]);
    }

    #[test]
    fn test_empty_nested_list_is_malformed() {
        let runner = ScriptedRunner::new();
        runner
            .expect("dasgoclient")
            .stdout(r#"[{"das": {}, "qhash": "x", "file": []}]"#)
            .finish();

        let err = DasClient::new(&runner, &Config::default())
            .valid_files("/A/B/C")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("empty 'file' list"));
        assert!(msg.contains("file dataset=/A/B/C instance=prod/phys03"));
    }

    #[test]
    fn test_nonzero_exit_reports_command_and_streams() {
        let runner = ScriptedRunner::new();
        runner
            .expect("dasgoclient")
            .exit_code(1)
            .stdout("partial")
            .stderr("DAS error: x509 expired")
            .finish();

        let err = DasClient::new(&runner, &Config::default())
            .valid_files("/A/B/C")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed executing dasgoclient --query"));
        assert!(msg.contains("Exitcode is 1"));
        assert!(msg.contains("  Stdout:\n    partial"));
        assert!(msg.contains("  Stderr:\n    DAS error: x509 expired"));
    }

    #[test]
    fn test_missing_binary_is_client_error() {
        let runner = ScriptedRunner::new();
        runner.expect("dasgoclient").fails_to_spawn().finish();

        let err = DasClient::new(&runner, &Config::default())
            .lumi_list_in_valid_files("/A/B/C")
            .unwrap_err();
        assert!(matches!(err, ClientError::Client(_)));
        assert!(err.to_string().contains("dasgoclient --query"));
    }

    #[test]
    fn test_truthy_flag_values() {
        #[derive(Deserialize)]
        struct Flag {
            #[serde(deserialize_with = "truthy")]
            v: bool,
        }
        let parse = |s: &str| serde_json::from_str::<Flag>(s).unwrap().v;
        assert!(parse(r#"{"v": 1}"#));
        assert!(parse(r#"{"v": "yes"}"#));
        assert!(!parse(r#"{"v": null}"#));
        assert!(!parse(r#"{"v": 0}"#));
        assert!(!parse(r#"{"v": ""}"#));
    }
}
