//! Dashboard page state: reporting period, transaction form, delete
//! confirmation and the bookkeeping that follows each mutation.
use api_types::{
    period::Period,
    summary::Summary,
    transaction::{FALLBACK_CATEGORIES, Transaction, TransactionInput, TransactionKind},
};
use chrono::{NaiveDate, SecondsFormat};
use thiserror::Error;

pub const DEFAULT_CATEGORY: &str = "Food";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,
    #[error("Select a category")]
    MissingCategory,
    #[error("Date must be YYYY-MM-DD")]
    InvalidDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Kind,
    Amount,
    Category,
    Description,
    Date,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        Self::Kind,
        Self::Amount,
        Self::Category,
        Self::Description,
        Self::Date,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Kind => "Type",
            Self::Amount => "Amount (₹)",
            Self::Category => "Category",
            Self::Description => "Description",
            Self::Date => "Date",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Kind => Self::Amount,
            Self::Amount => Self::Category,
            Self::Category => Self::Description,
            Self::Description => Self::Date,
            Self::Date => Self::Kind,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Kind => Self::Date,
            Self::Amount => Self::Kind,
            Self::Category => Self::Amount,
            Self::Description => Self::Category,
            Self::Date => Self::Description,
        }
    }
}

/// Transaction being created (`id == None`) or edited.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDraft {
    pub id: Option<String>,
    pub kind: TransactionKind,
    pub amount: String,
    pub category: String,
    pub description: String,
    pub date: String,
}

impl FormDraft {
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            id: None,
            kind: TransactionKind::Expense,
            amount: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            description: String::new(),
            date: today.format(DATE_FORMAT).to_string(),
        }
    }

    pub fn from_transaction(tx: &Transaction) -> Self {
        let id = tx.resolved_id();
        Self {
            id: (!id.is_empty()).then_some(id),
            kind: tx.kind,
            amount: format_amount_input(tx.amount),
            category: tx.category.clone(),
            description: tx.description.clone().unwrap_or_default(),
            date: tx.date.chars().take(10).collect(),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    pub fn title(&self) -> &'static str {
        if self.is_edit() {
            "Edit transaction"
        } else {
            "Add transaction"
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_edit() { "Update" } else { "Add" }
    }

    pub fn validate(&self) -> Result<TransactionInput, FormError> {
        let amount = self
            .amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite() && *a > 0.0)
            .ok_or(FormError::InvalidAmount)?;

        let category = self.category.trim();
        if category.is_empty() {
            return Err(FormError::MissingCategory);
        }

        let date = match self.date.trim() {
            "" => None,
            raw => {
                let day = NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .map_err(|_| FormError::InvalidDate)?;
                let midnight = day.and_hms_opt(0, 0, 0).ok_or(FormError::InvalidDate)?;
                Some(
                    midnight
                        .and_utc()
                        .to_rfc3339_opts(SecondsFormat::Millis, true),
                )
            }
        };

        Ok(TransactionInput {
            kind: self.kind,
            amount,
            currency: None,
            category: category.to_string(),
            description: Some(self.description.trim().to_string()),
            date,
        })
    }

    fn field_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Amount => Some(&mut self.amount),
            FormField::Description => Some(&mut self.description),
            FormField::Date => Some(&mut self.date),
            FormField::Kind | FormField::Category => None,
        }
    }
}

fn format_amount_input(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        amount.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn success_message(self) -> &'static str {
        match self {
            Self::Create => "Transaction created successfully",
            Self::Update => "Transaction updated successfully",
            Self::Delete => "Transaction deleted successfully",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Create => "Failed to create transaction",
            Self::Update => "Failed to update transaction",
            Self::Delete => "Failed to delete transaction",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(TransactionInput),
    Update { id: String, input: TransactionInput },
    Delete { id: String },
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Create(_) => MutationKind::Create,
            Self::Update { .. } => MutationKind::Update,
            Self::Delete { .. } => MutationKind::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Form,
}

#[derive(Debug)]
pub struct DashboardState {
    pub period: Period,
    pub today: NaiveDate,
    pub form: FormDraft,
    pub field: FormField,
    pub focus: Focus,
    pub form_error: Option<String>,
    pub delete_confirm: Option<String>,
    pub selected: usize,
    pub saving: bool,
    pub deleting: bool,
}

impl DashboardState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            period: Period::from_date(today),
            today,
            form: FormDraft::blank(today),
            field: FormField::Kind,
            focus: Focus::List,
            form_error: None,
            delete_confirm: None,
            selected: 0,
            saving: false,
            deleting: false,
        }
    }

    pub fn set_period(&mut self, period: Period) -> bool {
        if self.period == period {
            return false;
        }
        tracing::debug!(%period, "period changed");
        self.period = period;
        self.selected = 0;
        true
    }

    pub fn prev_period(&mut self) -> bool {
        self.set_period(self.period.prev())
    }

    pub fn next_period(&mut self) -> bool {
        self.set_period(self.period.next())
    }

    /// Loads `tx` into the draft. Refused while a submit is in flight, since
    /// its completion resets the draft.
    pub fn begin_edit(&mut self, tx: &Transaction) -> bool {
        if self.saving {
            return false;
        }
        self.form = FormDraft::from_transaction(tx);
        self.form_error = None;
        self.field = FormField::Amount;
        self.focus = Focus::Form;
        true
    }

    pub fn cancel_edit(&mut self) {
        self.reset_form();
        self.focus = Focus::List;
    }

    fn reset_form(&mut self) {
        self.form = FormDraft::blank(self.today);
        self.form_error = None;
        self.field = FormField::Kind;
    }

    /// Validates the draft and returns the mutation to send. On failure
    /// nothing is sent and the message is kept for display.
    pub fn submit(&mut self) -> Result<Mutation, FormError> {
        match self.form.validate() {
            Ok(input) => {
                self.form_error = None;
                self.saving = true;
                Ok(match self.form.id.clone() {
                    Some(id) => Mutation::Update { id, input },
                    None => Mutation::Create(input),
                })
            }
            Err(err) => {
                self.form_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Opens the confirmation modal. Records without an id cannot be deleted.
    pub fn request_delete(&mut self, id: String) -> bool {
        if id.is_empty() {
            return false;
        }
        self.delete_confirm = Some(id);
        true
    }

    pub fn confirm_delete(&mut self) -> Option<Mutation> {
        if self.deleting {
            return None;
        }
        let id = self.delete_confirm.clone()?;
        self.deleting = true;
        Some(Mutation::Delete { id })
    }

    pub fn dismiss_delete(&mut self) {
        self.delete_confirm = None;
    }

    pub fn on_mutation_success(&mut self, kind: MutationKind) {
        match kind {
            MutationKind::Create => {
                self.saving = false;
                self.form.amount.clear();
                self.form.description.clear();
                self.form_error = None;
            }
            MutationKind::Update => {
                self.saving = false;
                self.reset_form();
            }
            MutationKind::Delete => {
                self.deleting = false;
                self.delete_confirm = None;
            }
        }
    }

    pub fn on_mutation_failure(&mut self, kind: MutationKind) {
        match kind {
            MutationKind::Create | MutationKind::Update => self.saving = false,
            MutationKind::Delete => {
                self.deleting = false;
                self.delete_confirm = None;
            }
        }
    }

    pub fn next_field(&mut self) {
        self.field = self.field.next();
    }

    pub fn prev_field(&mut self) {
        self.field = self.field.prev();
    }

    pub fn input(&mut self, ch: char) {
        match self.field {
            FormField::Kind => {
                if ch == ' ' {
                    self.form.kind = self.form.kind.toggle();
                } else if ch.eq_ignore_ascii_case(&'i') {
                    self.form.kind = TransactionKind::Income;
                } else if ch.eq_ignore_ascii_case(&'e') {
                    self.form.kind = TransactionKind::Expense;
                }
            }
            FormField::Amount => {
                if ch.is_ascii_digit() || ch == '.' {
                    self.form.amount.push(ch);
                }
            }
            FormField::Date => {
                if ch.is_ascii_digit() || ch == '-' {
                    self.form.date.push(ch);
                }
            }
            field => {
                if let Some(value) = self.form.field_mut(field) {
                    value.push(ch);
                }
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(value) = self.form.field_mut(self.field) {
            value.pop();
        }
    }

    /// Moves the category selection through `categories`, wrapping around.
    pub fn cycle_category(&mut self, categories: &[String], forward: bool) {
        if categories.is_empty() {
            return;
        }
        let len = categories.len();
        let next = match categories.iter().position(|c| *c == self.form.category) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.form.category = categories[next].clone();
    }

    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1).min(len - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

/// Server categories when available and non-empty, otherwise the fallback set.
pub fn categories_for_form(server: Option<&[String]>) -> Vec<String> {
    match server {
        Some(list) if !list.is_empty() => list.to_vec(),
        _ => FALLBACK_CATEGORIES.iter().map(|c| c.to_string()).collect(),
    }
}

/// Income and expense bars, skipping zero values.
pub fn income_expense_bars(summary: &Summary) -> Vec<(&'static str, f64)> {
    [
        ("Income", summary.total_income),
        ("Expense", summary.total_expense),
    ]
    .into_iter()
    .filter(|(_, value)| *value > 0.0)
    .collect()
}

/// Category breakdown with absolute amounts.
pub fn category_bars(summary: &Summary) -> Vec<(String, f64)> {
    summary
        .category_breakdown
        .iter()
        .map(|(name, value)| (name.clone(), value.abs()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    fn state_with(amount: &str, category: &str) -> DashboardState {
        let mut state = DashboardState::new(today());
        state.form.amount = amount.to_string();
        state.form.category = category.to_string();
        state
    }

    #[test]
    fn starts_on_current_period_with_blank_expense_draft() {
        let state = DashboardState::new(today());
        assert_eq!(state.period.to_string(), "2024-05");
        assert_eq!(state.form.kind, TransactionKind::Expense);
        assert_eq!(state.form.category, "Food");
        assert_eq!(state.form.date, "2024-05-17");
        assert_eq!(state.form.submit_label(), "Add");
        assert_eq!(state.form.title(), "Add transaction");
    }

    #[test]
    fn zero_or_negative_amount_is_withheld() {
        for amount in ["0", "-5", "", "abc", "0.0"] {
            let mut state = state_with(amount, "Food");
            assert_eq!(state.submit(), Err(FormError::InvalidAmount), "amount {amount:?}");
            assert_eq!(
                state.form_error.as_deref(),
                Some("Amount must be greater than zero")
            );
            assert!(!state.saving);
        }
    }

    #[test]
    fn missing_category_is_withheld() {
        let mut state = state_with("12", "  ");
        assert_eq!(state.submit(), Err(FormError::MissingCategory));
    }

    #[test]
    fn invalid_date_is_withheld() {
        let mut state = state_with("12", "Food");
        state.form.date = "2024-13-40".to_string();
        assert_eq!(state.submit(), Err(FormError::InvalidDate));
    }

    #[test]
    fn valid_draft_creates_with_utc_midnight_date() {
        let mut state = state_with("12.50", "Food");
        state.form.description = "lunch".to_string();
        let mutation = state.submit().unwrap();
        let Mutation::Create(input) = mutation else {
            panic!("expected create");
        };
        assert_eq!(input.amount, 12.5);
        assert_eq!(input.kind, TransactionKind::Expense);
        assert_eq!(input.date.as_deref(), Some("2024-05-17T00:00:00.000Z"));
        assert_eq!(input.description.as_deref(), Some("lunch"));
        assert!(state.saving);
    }

    #[test]
    fn editing_switches_submit_to_update() {
        let tx: Transaction = serde_json::from_value(json!({
            "_id": {"$oid": "abc123"},
            "type": "income",
            "amount": 2500.0,
            "category": "Salary",
            "description": "May",
            "date": "2024-05-01T09:30:00Z"
        }))
        .unwrap();

        let mut state = DashboardState::new(today());
        assert!(state.begin_edit(&tx));
        assert_eq!(state.form.submit_label(), "Update");
        assert_eq!(state.form.date, "2024-05-01");
        assert_eq!(state.form.amount, "2500");
        assert_eq!(state.focus, Focus::Form);

        match state.submit().unwrap() {
            Mutation::Update { id, input } => {
                assert_eq!(id, "abc123");
                assert_eq!(input.kind, TransactionKind::Income);
            }
            other => panic!("unexpected {other:?}"),
        }

        state.on_mutation_success(MutationKind::Update);
        assert!(!state.form.is_edit());
        assert_eq!(state.form, FormDraft::blank(today()));
    }

    #[test]
    fn create_success_keeps_kind_category_and_date() {
        let mut state = state_with("40", "Rent");
        state.form.kind = TransactionKind::Income;
        state.form.description = "x".to_string();
        state.submit().unwrap();
        state.on_mutation_success(MutationKind::Create);
        assert_eq!(state.form.amount, "");
        assert_eq!(state.form.description, "");
        assert_eq!(state.form.category, "Rent");
        assert_eq!(state.form.kind, TransactionKind::Income);
        assert!(!state.saving);
    }

    #[test]
    fn edit_is_refused_while_a_create_is_saving() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": "t9",
            "type": "expense",
            "amount": 80.0,
            "category": "Rent",
            "description": "June",
            "date": "2024-05-03T00:00:00Z"
        }))
        .unwrap();

        let mut state = state_with("40", "Food");
        state.submit().unwrap();
        assert!(!state.begin_edit(&tx));
        assert!(!state.form.is_edit());

        state.on_mutation_success(MutationKind::Create);
        assert!(state.begin_edit(&tx));
        assert_eq!(state.form.amount, "80");
        assert_eq!(state.form.description, "June");
    }

    #[test]
    fn cancel_edit_resets_draft() {
        let mut state = DashboardState::new(today());
        state.form.id = Some("x".to_string());
        state.form.amount = "9".to_string();
        state.cancel_edit();
        assert_eq!(state.form, FormDraft::blank(today()));
        assert_eq!(state.focus, Focus::List);
    }

    #[test]
    fn delete_needs_confirmation_and_an_id() {
        let mut state = DashboardState::new(today());
        assert!(state.confirm_delete().is_none());
        assert!(!state.request_delete(String::new()));

        assert!(state.request_delete("t1".to_string()));
        assert_eq!(
            state.confirm_delete(),
            Some(Mutation::Delete {
                id: "t1".to_string()
            })
        );
        // a second confirm while the first is in flight is ignored
        assert!(state.confirm_delete().is_none());

        state.on_mutation_failure(MutationKind::Delete);
        assert!(state.delete_confirm.is_none());
        assert!(!state.deleting);
    }

    #[test]
    fn dismiss_closes_the_modal() {
        let mut state = DashboardState::new(today());
        state.request_delete("t1".to_string());
        state.dismiss_delete();
        assert!(state.delete_confirm.is_none());
    }

    #[test]
    fn period_navigation_reports_changes() {
        let mut state = DashboardState::new(today());
        state.selected = 3;
        assert!(state.prev_period());
        assert_eq!(state.period.to_string(), "2024-04");
        assert_eq!(state.selected, 0);
        assert!(!state.set_period(state.period));
        assert!(state.next_period());
        assert!(state.next_period());
        assert_eq!(state.period.to_string(), "2024-06");
    }

    #[test]
    fn categories_fall_back_when_server_list_missing_or_empty() {
        assert_eq!(categories_for_form(None).len(), 9);
        assert_eq!(categories_for_form(Some(&[][..])).first().unwrap(), "Salary");
        let server = vec!["Books".to_string()];
        assert_eq!(categories_for_form(Some(server.as_slice())), server);
    }

    #[test]
    fn category_cycle_wraps() {
        let categories = categories_for_form(None);
        let mut state = DashboardState::new(today());
        state.form.category = "Other".to_string();
        state.cycle_category(&categories, true);
        assert_eq!(state.form.category, "Salary");
        state.cycle_category(&categories, false);
        assert_eq!(state.form.category, "Other");
        state.form.category = "Unknown".to_string();
        state.cycle_category(&categories, false);
        assert_eq!(state.form.category, "Salary");
    }

    #[test]
    fn field_input_filters_characters() {
        let mut state = DashboardState::new(today());
        state.field = FormField::Amount;
        for ch in "1a2.5".chars() {
            state.input(ch);
        }
        assert_eq!(state.form.amount, "12.5");
        state.backspace();
        assert_eq!(state.form.amount, "12.");

        state.field = FormField::Kind;
        state.input(' ');
        assert_eq!(state.form.kind, TransactionKind::Income);
        state.input('e');
        assert_eq!(state.form.kind, TransactionKind::Expense);
    }

    #[test]
    fn chart_data_skips_zero_and_uses_absolute_breakdown() {
        let summary = Summary {
            total_income: 0.0,
            total_expense: 120.0,
            balance: -120.0,
            category_breakdown: BTreeMap::from([
                ("Food".to_string(), -80.0),
                ("Salary".to_string(), 40.0),
            ]),
        };
        assert_eq!(income_expense_bars(&summary), vec![("Expense", 120.0)]);
        assert_eq!(
            category_bars(&summary),
            vec![("Food".to_string(), 80.0), ("Salary".to_string(), 40.0)]
        );
    }
}
