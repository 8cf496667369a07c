use std::collections::HashMap;

#[derive(PartialEq, Debug)]
pub struct QueryString {
    items: HashMap<String, String>,
}

impl QueryString {
    pub fn from(buf: &str) -> Self {
        let vs: Vec<(String, String)> = serde_urlencoded::from_str(buf).unwrap_or_else(|_| vec![]);
        let items: HashMap<String, String> = vs.into_iter().collect();

        QueryString {
            items,
        }
    }

    /// The selected category. Blank means every category.
    pub fn get_category(&self) -> Option<&str> {
        self.items.get("category")
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }
}
