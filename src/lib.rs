pub mod config;
pub mod entry;
pub mod error;
pub mod form;
pub mod pagination;
pub mod record;
pub mod store;
pub mod theme;

pub use entry::{Entry, FlowType};
pub use error::{ConfigError, LedgerError, RecordError, ValidationError};
pub use form::EntryForm;
pub use pagination::PaginatedView;
pub use store::{Ledger, LedgerStore};
pub use theme::ThemeMode;

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::dec;
    use tempfile::TempDir;

    use crate::config::AppPaths;

    fn submit(
        form: &mut EntryForm,
        store: &LedgerStore,
        name: &str,
        amount: &str,
        reason: &str,
        tag: &str,
        flow_type: FlowType,
    ) -> Entry {
        form.set_date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        form.set_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        form.set_name(name);
        form.set_amount(amount);
        form.set_reason(reason);
        form.set_tag(tag);
        form.set_flow_type(flow_type);
        form.submit(store).unwrap()
    }

    #[test]
    fn test_milk_and_salary_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AppPaths::with_base_dir(temp_dir.path());
        let store = LedgerStore::open(paths.ensure_store().unwrap());
        let mut form = EntryForm::default();

        let milk = submit(&mut form, &store, "Milk", "40", "daily", "milk", FlowType::Debit);
        let salary = submit(
            &mut form,
            &store,
            "Salary",
            "50000",
            "monthly",
            "salary",
            FlowType::Credit,
        );
        assert_eq!(milk.amount, dec!(40));
        assert_eq!(salary.amount, dec!(50000));

        let entries = store.read_all().unwrap();
        assert_eq!(entries, vec![milk, salary]);

        let mut view = PaginatedView::new(entries, NonZeroUsize::new(1).unwrap());
        assert_eq!(view.page_count(), 2);
        assert_eq!(view.current_page_rows()[0].name, "Milk");

        view.next_page();
        assert_eq!(view.current_page_rows()[0].name, "Salary");
        assert_eq!(view.numbered_rows().next().map(|(n, _)| n), Some(2));
    }

    #[test]
    fn test_fresh_store_has_one_empty_page() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(
            AppPaths::with_base_dir(temp_dir.path())
                .ensure_store()
                .unwrap(),
        );

        let entries = store.read_all().unwrap();
        assert!(entries.is_empty());

        let view = PaginatedView::new(entries, NonZeroUsize::new(5).unwrap());
        assert_eq!(view.page_count(), 1);
        assert!(view.current_page_rows().is_empty());
    }
}
