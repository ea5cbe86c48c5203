use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::services::{MetadataCatalog, ReleaseCatalog};
use crate::validate::FieldError;

static DATASET_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/[a-zA-Z0-9\-_]{1,99}/[a-zA-Z0-9\.\-_]{1,199}/[A-Z\-]{1,50}$")
        .expect("dataset pattern")
});

static RUN_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}$").expect("run pattern"));

#[derive(Debug, Clone, Copy)]
enum Lookup {
    Dataset,
    Run,
}

impl Lookup {
    fn is_well_formed(self, entry: &str) -> bool {
        match self {
            Lookup::Dataset => DATASET_NAME.is_match(entry),
            Lookup::Run => RUN_NUMBER.is_match(entry),
        }
    }

    fn format_error(self, entries: Vec<String>) -> FieldError {
        match self {
            Lookup::Dataset => FieldError::InvalidFormat(entries),
            Lookup::Run => FieldError::NumericFormat(entries),
        }
    }
}

/// Checks every dataset and reports all offenders at once.
pub async fn check_datasets(
    catalog: Arc<dyn MetadataCatalog>,
    datasets: &[String],
) -> Vec<FieldError> {
    check_entries(catalog, Lookup::Dataset, datasets).await
}

/// Checks every run number and reports all offenders at once.
pub async fn check_runs(catalog: Arc<dyn MetadataCatalog>, runs: &[String]) -> Vec<FieldError> {
    check_entries(catalog, Lookup::Run, runs).await
}

pub async fn check_release(releases: &dyn ReleaseCatalog, release: &str) -> Option<FieldError> {
    match releases.release_exists(release).await {
        Ok(true) => None,
        Ok(false) => Some(FieldError::ReleaseNotFound(release.to_string())),
        Err(err) => {
            warn!(release, error = %err, "release lookup failed");
            Some(FieldError::CatalogUnavailable(err.to_string()))
        }
    }
}

/// Malformed entries are reported without a lookup; the rest are queried
/// concurrently and joined before the verdict. Results keep input order.
async fn check_entries(
    catalog: Arc<dyn MetadataCatalog>,
    lookup: Lookup,
    entries: &[String],
) -> Vec<FieldError> {
    let mut malformed = Vec::new();
    let mut tasks = JoinSet::new();

    for (index, entry) in entries.iter().enumerate() {
        if !lookup.is_well_formed(entry) {
            malformed.push(entry.clone());
            continue;
        }
        let catalog = Arc::clone(&catalog);
        let entry = entry.clone();
        tasks.spawn(async move {
            let found = match lookup {
                Lookup::Dataset => catalog.dataset_exists(&entry).await,
                Lookup::Run => catalog.run_exists(&entry).await,
            };
            (index, entry, found)
        });
    }

    let mut missing = Vec::new();
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, _, Ok(true))) => {}
            Ok((index, entry, Ok(false))) => missing.push((index, entry)),
            Ok((index, entry, Err(err))) => {
                warn!(entry = %entry, error = %err, "catalog lookup failed");
                failures.push((index, format!("{entry}: {err}")));
            }
            Err(err) => failures.push((usize::MAX, format!("lookup task failed: {err}"))),
        }
    }
    missing.sort();
    failures.sort();
    debug!(
        ?lookup,
        checked = entries.len(),
        malformed = malformed.len(),
        missing = missing.len(),
        "catalog check finished"
    );

    let mut errors = Vec::new();
    if !malformed.is_empty() {
        errors.push(lookup.format_error(malformed));
    }
    if !missing.is_empty() {
        errors.push(FieldError::NotFound(
            missing.into_iter().map(|(_, entry)| entry).collect(),
        ));
    }
    if !failures.is_empty() {
        errors.push(FieldError::CatalogUnavailable(
            failures
                .into_iter()
                .map(|(_, message)| message)
                .collect::<Vec<_>>()
                .join("; "),
        ));
    }
    errors
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::{FakeCatalog, FakeReleases};

    fn is_valid_dataset_name(dataset: &str) -> bool {
        Lookup::Dataset.is_well_formed(dataset)
    }

    fn is_valid_run_number(run: &str) -> bool {
        Lookup::Run.is_well_formed(run)
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn dataset_pattern_requires_three_segments() {
        assert!(is_valid_dataset_name("/HLTPhysics/Run2022C-v1/RAW"));
        assert!(is_valid_dataset_name("/JetHT/Run2022C-PromptReco-v1/MINIAOD"));
        assert!(!is_valid_dataset_name("/HLTPhysics/Run2022C-v1"));
        assert!(!is_valid_dataset_name("HLTPhysics/Run2022C-v1/RAW"));
        assert!(!is_valid_dataset_name("/HLTPhysics/Run2022C-v1/raw"));
        assert!(!is_valid_dataset_name("/HLT Physics/Run2022C-v1/RAW"));
        assert!(!is_valid_dataset_name(&format!("/{}/Run2022C-v1/RAW", "A".repeat(100))));
    }

    #[test]
    fn run_numbers_need_six_digits() {
        assert!(is_valid_run_number("123456"));
        assert!(!is_valid_run_number("12345"));
        assert!(!is_valid_run_number("abcdef"));
        assert!(!is_valid_run_number("1234567"));
    }

    #[tokio::test]
    async fn malformed_datasets_are_never_looked_up() {
        let catalog = FakeCatalog::default();
        let lookups = catalog.lookups();

        let errors = check_datasets(Arc::new(catalog), &names(&["/A/B", "bogus"])).await;

        assert_eq!(
            errors,
            vec![FieldError::InvalidFormat(names(&["/A/B", "bogus"]))]
        );
        assert_eq!(lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn lists_every_missing_dataset_in_input_order() {
        let catalog = FakeCatalog::with_datasets(&["/ZeroBias/Run2022C-v1/RAW"]);
        let lookups = catalog.lookups();
        let datasets = names(&[
            "/HLTPhysics/Run2022C-v1/RAW",
            "/ZeroBias/Run2022C-v1/RAW",
            "/JetHT/Run2022C-v1/RAW",
        ]);

        let errors = check_datasets(Arc::new(catalog), &datasets).await;

        assert_eq!(
            errors,
            vec![FieldError::NotFound(names(&[
                "/HLTPhysics/Run2022C-v1/RAW",
                "/JetHT/Run2022C-v1/RAW",
            ]))]
        );
        assert_eq!(lookups.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn runs_report_format_and_catalog_errors_together() {
        let catalog = FakeCatalog::default().runs(&["123456"]);

        let errors = check_runs(
            Arc::new(catalog),
            &names(&["123456", "12345", "abcdef", "654321"]),
        )
        .await;

        assert_eq!(
            errors,
            vec![
                FieldError::NumericFormat(names(&["12345", "abcdef"])),
                FieldError::NotFound(names(&["654321"])),
            ]
        );
    }

    #[tokio::test]
    async fn catalog_failures_become_field_errors() {
        let catalog = FakeCatalog::default().failing();

        let errors = check_runs(Arc::new(catalog), &names(&["123456"])).await;

        assert!(matches!(errors.as_slice(), [FieldError::CatalogUnavailable(_)]));
    }

    #[tokio::test]
    async fn release_check_reports_unknown_releases() {
        let releases = FakeReleases::new(&["CMSSW_12_4_0"]);

        assert_eq!(check_release(&releases, "CMSSW_12_4_0").await, None);
        assert_eq!(
            check_release(&releases, "CMSSW_99_0_0").await,
            Some(FieldError::ReleaseNotFound("CMSSW_99_0_0".to_string()))
        );
    }
}
