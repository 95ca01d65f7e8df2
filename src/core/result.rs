use crate::core::output::Category;
use crate::schemas::convert::ConversionResult;

/// URL path prefix the output root is served under.
pub const STATIC_PREFIX: &str = "tmp";

/// Builds download links from the access address fixed at startup.
#[derive(Debug, Clone)]
pub struct ResultBuilder {
    address: String,
}

impl ResultBuilder {
    pub fn new(access_address: &str) -> Self {
        let address = access_address.trim();
        let address = address
            .strip_prefix("http://")
            .or_else(|| address.strip_prefix("https://"))
            .unwrap_or(address);

        Self {
            address: address.trim_matches('/').to_string(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn build(&self, category: Category, filename: String) -> ConversionResult {
        let url = format!(
            "http://{}/{}/{}",
            self.address,
            STATIC_PREFIX,
            category.relative_path(&filename)
        );
        ConversionResult { url, filename }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_and_scheme_are_stripped() {
        assert_eq!(ResultBuilder::new("/10.1.2.3:8000/").address(), "10.1.2.3:8000");
        assert_eq!(ResultBuilder::new("http://example.com/").address(), "example.com");
    }

    #[test]
    fn url_points_into_static_tree() {
        let builder = ResultBuilder::new("files.local:8080");
        let result = builder.build(Category::Pdf, "invoice".to_string());

        assert_eq!(result.url, "http://files.local:8080/tmp/pdf/invoice.pdf");
        assert_eq!(result.filename, "invoice");

        let report = builder.build(Category::Json, "r-1".to_string());
        assert_eq!(report.url, "http://files.local:8080/tmp/json/r-1.html");
    }
}
