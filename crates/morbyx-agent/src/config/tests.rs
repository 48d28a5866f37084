#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = Config::from_toml(
            r#"
            [graph]
            endpoint = "http://localhost:8080/query"
            "#,
        )
        .unwrap();
        assert_eq!(config.graph.endpoint, "http://localhost:8080/query");
        assert_eq!(config.search.max_articles, 1000);
        assert!(config.models.use_gpu);
        assert!(config.models.reader_dir.is_none());
    }

    #[test]
    fn test_full_config_round_trip() {
        let config = Config::from_toml(
            r#"
            [graph]
            endpoint = "https://graph.example.org/query"

            [models]
            classifier_dir = "./trained/binary_classification"
            reader_dir = "./trained/question_answering"
            use_gpu = false

            [search]
            max_articles = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.search.max_articles, 250);
        assert!(!config.models.use_gpu);
        assert_eq!(
            config.models.reader_dir.as_deref(),
            Some("./trained/question_answering")
        );
    }

    #[test]
    fn test_missing_graph_section_fails() {
        assert!(Config::from_toml("[search]\nmax_articles = 10").is_err());
    }
}
