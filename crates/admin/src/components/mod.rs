//! View building blocks shared by several pages.

pub mod data_table;

pub use data_table::{DataTable, ListParams, TableColumn};

/// A choice in a `<select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    /// Options for `items`, marking the one whose value equals `selected`.
    pub fn list<T>(
        items: &[T],
        selected: &str,
        value: impl Fn(&T) -> String,
        label: impl Fn(&T) -> String,
    ) -> Vec<Self> {
        items
            .iter()
            .map(|item| {
                let value = value(item);
                Self {
                    selected: value == selected,
                    label: label(item),
                    value,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_option() {
        let options = SelectOption::list(&[1, 2, 3], "2", ToString::to_string, |n| format!("#{n}"));
        assert_eq!(options.len(), 3);
        assert!(options[1].selected);
        assert_eq!(options[1].label, "#2");
        assert!(!options[0].selected);
    }
}
