//! Stages 3a/3b: per-table detail records
//!
//! Both detail endpoints share the request template, the envelope and the
//! walk; they differ in the table type they read from the index, the
//! endpoint prefix and the output schema. [`DetailTable`] carries those
//! differences.

use std::path::PathBuf;

use anyhow::Context;
use nfzstat_core::{
    ColumnFilter, ManifestWriter, PageCount, PageSource, PageWalker, ProgressContext, Query,
    RateLimiter, Row, WriteMode, envelope, fmt_num, manifest, path_segment,
};
use serde::de::DeserializeOwned;

use super::{StageClock, StageSummary, project, settle, split_outcome};
use crate::config::Config;
use crate::schema::{GeneralDataRecord, HospitalizationByAgeRecord};
use crate::state::{Stage, TableType};

/// A detail table: which ids it reads, where it fetches them, where it writes.
pub trait DetailTable: Row + DeserializeOwned {
    const STAGE: Stage;
    const TABLE_TYPE: TableType;
    /// Endpoint prefix; the table id is appended as one encoded path segment
    const ENDPOINT: &'static str;

    fn output_path(config: &Config) -> PathBuf;

    fn endpoint(table_id: &str) -> String {
        format!("{}/{}", Self::ENDPOINT, path_segment(table_id))
    }
}

impl DetailTable for GeneralDataRecord {
    const STAGE: Stage = Stage::GeneralData;
    const TABLE_TYPE: TableType = TableType::GeneralData;
    const ENDPOINT: &'static str = "basic-data";

    fn output_path(config: &Config) -> PathBuf {
        config.general_data_path()
    }
}

impl DetailTable for HospitalizationByAgeRecord {
    const STAGE: Stage = Stage::HospitalizationByAge;
    const TABLE_TYPE: TableType = TableType::HospitalizationByAge;
    const ENDPOINT: &'static str = "hospitalizations-by-patient-age";

    fn output_path(config: &Config) -> PathBuf {
        config.hospitalization_by_age_path()
    }
}

/// Shared query of both detail endpoints, before `limit` and `page`
fn detail_template() -> Query {
    Query::new()
        .with("branch", "true")
        .with("hospitalType", "false")
        .with("format", "json")
}

/// Walk every table of type `R::TABLE_TYPE` listed in the table index and
/// overwrite the stage output with the projected records.
pub fn run<R: DetailTable, S: PageSource + ?Sized>(
    source: &S,
    config: &Config,
    progress: &ProgressContext,
) -> anyhow::Result<StageSummary> {
    let input = config.table_index_path();
    let table_ids = manifest::load_column(
        &input,
        "table_id",
        Some(ColumnFilter {
            column: "table_type",
            value: R::TABLE_TYPE.as_str(),
        }),
    )
    .context("Cannot load table index. Run the index-of-tables stage first.")?;

    let clock = StageClock::start(R::STAGE);
    log::info!(
        "{} tables of type {} in {}",
        fmt_num(table_ids.len()),
        R::TABLE_TYPE,
        input.display()
    );

    let path = R::output_path(config);
    let mut writer = ManifestWriter::<R>::open(&path, WriteMode::Overwrite)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    let walker = PageWalker::new(
        config.page_limit,
        PageCount::CeilPlusOne,
        RateLimiter::new(config.delay),
    );
    let template = detail_template();
    let mut units = progress.units(R::STAGE.name(), table_ids.len());
    let mut failed = 0;

    for table_id in &table_ids {
        let endpoint = R::endpoint(table_id);
        let (records, walk_error) =
            split_outcome(walker.walk(source, &endpoint, &template, envelope::NESTED_RECORDS));
        let (rows, project_error) = project::<R>(records);
        let settled = settle(
            &endpoint,
            rows,
            walk_error.or(project_error),
            config.failure_policy,
        );
        failed += usize::from(settled.failed);
        writer
            .write_rows(&settled.rows)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        units.advance(table_id);
    }
    units.finish();

    Ok(clock.finish(table_ids.len(), failed, writer.rows_written()))
}

pub fn run_general_data<S: PageSource + ?Sized>(
    source: &S,
    config: &Config,
    progress: &ProgressContext,
) -> anyhow::Result<StageSummary> {
    run::<GeneralDataRecord, S>(source, config, progress)
}

pub fn run_hospitalization_by_age<S: PageSource + ?Sized>(
    source: &S,
    config: &Config,
    progress: &ProgressContext,
) -> anyhow::Result<StageSummary> {
    run::<HospitalizationByAgeRecord, S>(source, config, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailurePolicy;
    use crate::schema::TableRow;
    use crate::stages::testing::{ScriptedApi, page_of};
    use nfzstat_core::FetchError;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        Config {
            output_dir: dir.path().to_path_buf(),
            delay: std::time::Duration::ZERO,
            ..Default::default()
        }
    }

    fn write_index(config: &Config, tables: &[(&str, &str)]) {
        let rows: Vec<TableRow> = tables
            .iter()
            .map(|(id, ty)| TableRow {
                table_id: id.to_string(),
                table_type: ty.to_string(),
            })
            .collect();
        manifest::write(&config.table_index_path(), &rows, WriteMode::Overwrite).unwrap();
    }

    /// Detail endpoint for one table serving `n` records named `<id>-<i>`
    fn detail_page(table_id: &str, n: usize, q: &Query) -> Value {
        let data: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "year": 2019,
                    "branch": "07 - mazowiecki",
                    "name": format!("{table_id}-{i}"),
                    "age-group-name": "18-40",
                    "number-of-hospitalizations": i,
                })
            })
            .collect();
        json!({
            "meta": {"count": n},
            "data": {"attributes": {"data": page_of(&data, q)}}
        })
    }

    fn names_in(path: &std::path::Path) -> Vec<String> {
        manifest::load_column(path, "name", None).unwrap()
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(GeneralDataRecord::endpoint("123"), "basic-data/123");
        assert_eq!(
            HospitalizationByAgeRecord::endpoint("9"),
            "hospitalizations-by-patient-age/9"
        );
    }

    #[test]
    fn reserved_characters_stay_in_one_segment() {
        assert_eq!(
            GeneralDataRecord::endpoint("12/34?x#y"),
            "basic-data/12%2F34%3Fx%23y"
        );
    }

    #[test]
    fn walks_only_tables_of_its_type() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            page_limit: 2,
            ..config(&dir)
        };
        write_index(
            &config,
            &[
                ("t1", "general-data"),
                ("t2", "hospitalization-by-age"),
                ("t3", "general-data"),
            ],
        );
        let api = ScriptedApi::default()
            .route("basic-data/t1", |q| Ok(detail_page("t1", 3, q)))
            .route("basic-data/t3", |q| Ok(detail_page("t3", 4, q)));

        let summary = run_general_data(&api, &config, &ProgressContext::hidden()).unwrap();
        assert_eq!(summary.units, 2);
        assert_eq!(summary.rows, 7);
        assert_eq!(api.calls_to("hospitalizations-by-patient-age/t2"), 0);
        // ceil(3/2)+1 and ceil(4/2)+1
        assert_eq!(api.calls_to("basic-data/t1"), 3);
        assert_eq!(api.calls_to("basic-data/t3"), 3);

        assert_eq!(
            names_in(&config.general_data_path()),
            ["t1-0", "t1-1", "t1-2", "t3-0", "t3-1", "t3-2", "t3-3"]
        );
    }

    #[test]
    fn sends_detail_query() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        write_index(&config, &[("t2", "hospitalization-by-age")]);
        let api = ScriptedApi::default().route("hospitalizations-by-patient-age/t2", |q| {
            Ok(detail_page("t2", 1, q))
        });

        run_hospitalization_by_age(&api, &config, &ProgressContext::hidden()).unwrap();

        let calls = api.calls.borrow();
        let query = &calls[0].1;
        assert_eq!(query.get("branch"), Some("true"));
        assert_eq!(query.get("hospitalType"), Some("false"));
        assert_eq!(query.get("format"), Some("json"));
        assert_eq!(query.get("limit"), Some("25"));
        assert_eq!(query.page(), Some(1));
        let ages = manifest::load_column(
            &config.hospitalization_by_age_path(),
            "age-group-name",
            None,
        )
        .unwrap();
        assert_eq!(ages, ["18-40"]);
    }

    #[test]
    fn timeout_skips_table_and_continues() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        write_index(&config, &[("slow", "general-data"), ("ok", "general-data")]);
        let api = ScriptedApi::default()
            .route("basic-data/slow", |_| Err(FetchError::Timeout))
            .route("basic-data/ok", |q| Ok(detail_page("ok", 2, q)));

        let summary = run_general_data(&api, &config, &ProgressContext::hidden()).unwrap();
        assert_eq!(summary.failed_units, 1);
        assert_eq!(names_in(&config.general_data_path()), ["ok-0", "ok-1"]);
    }

    #[test]
    fn mid_walk_failure_policy() {
        let api = || {
            ScriptedApi::default().route("basic-data/t1", |q| match q.page() {
                Some(1) => Ok(detail_page("t1", 3, q)),
                _ => Err(FetchError::Http {
                    status: Some(500),
                    message: "boom".into(),
                }),
            })
        };

        let dir = TempDir::new().unwrap();
        let skip = Config {
            page_limit: 2,
            ..config(&dir)
        };
        write_index(&skip, &[("t1", "general-data")]);
        let summary = run_general_data(&api(), &skip, &ProgressContext::hidden()).unwrap();
        assert_eq!(summary.rows, 0);

        let keep = Config {
            failure_policy: FailurePolicy::KeepPartial,
            ..skip
        };
        let summary = run_general_data(&api(), &keep, &ProgressContext::hidden()).unwrap();
        assert_eq!(summary.failed_units, 1);
        assert_eq!(names_in(&keep.general_data_path()), ["t1-0", "t1-1"]);
    }

    #[test]
    fn non_object_record_fails_unit() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        write_index(&config, &[("t1", "general-data")]);
        let api = ScriptedApi::default().route("basic-data/t1", |_| {
            Ok(json!({"meta": {"count": 2}, "data": {"attributes": {"data": [{"name": "a"}, 5]}}}))
        });

        let summary = run_general_data(&api, &config, &ProgressContext::hidden()).unwrap();
        assert_eq!(summary.failed_units, 1);
        assert!(names_in(&config.general_data_path()).is_empty());
    }

    #[test]
    fn overwrites_previous_output() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        write_index(&config, &[("t1", "general-data")]);
        let api = ScriptedApi::default().route("basic-data/t1", |q| Ok(detail_page("t1", 1, q)));

        run_general_data(&api, &config, &ProgressContext::hidden()).unwrap();
        run_general_data(&api, &config, &ProgressContext::hidden()).unwrap();
        assert_eq!(names_in(&config.general_data_path()), ["t1-0"]);
    }

    #[test]
    fn empty_index_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        write_index(&config, &[("t2", "hospitalization-by-age")]);

        let summary =
            run_general_data(&ScriptedApi::default(), &config, &ProgressContext::hidden()).unwrap();
        assert_eq!(summary.units, 0);
        let raw = std::fs::read_to_string(config.general_data_path()).unwrap();
        assert!(raw.contains("year,branch,name,number-of-patients"));
    }

    #[test]
    fn missing_index_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = run_hospitalization_by_age(
            &ScriptedApi::default(),
            &config(&dir),
            &ProgressContext::hidden(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("index-of-tables"));
    }
}
