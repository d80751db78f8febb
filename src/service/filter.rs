/// Which lookup a `GET /cars` request runs, chosen from its optional
/// `model` and `year` parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CarFilter {
    All,
    Model(String),
    Year(i32),
    ModelAndYear(String, i32),
}

impl CarFilter {
    pub fn from_params(model: Option<String>, year: Option<i32>) -> Self {
        match (model, year) {
            (None, None) => CarFilter::All,
            (Some(model), None) => CarFilter::Model(model),
            (None, Some(year)) => CarFilter::Year(year),
            (Some(model), Some(year)) => CarFilter::ModelAndYear(model, year),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_params_selects_all() {
        assert_eq!(CarFilter::from_params(None, None), CarFilter::All);
    }

    #[test]
    fn single_param_selects_single_filter() {
        assert_eq!(
            CarFilter::from_params(Some("fiesta".into()), None),
            CarFilter::Model("fiesta".into())
        );
        assert_eq!(
            CarFilter::from_params(None, Some(2000)),
            CarFilter::Year(2000)
        );
    }

    #[test]
    fn both_params_select_combined_filter() {
        assert_eq!(
            CarFilter::from_params(Some("fiesta".into()), Some(2000)),
            CarFilter::ModelAndYear("fiesta".into(), 2000)
        );
    }

    #[test]
    fn empty_model_still_counts_as_present() {
        assert_eq!(
            CarFilter::from_params(Some(String::new()), None),
            CarFilter::Model(String::new())
        );
    }
}
