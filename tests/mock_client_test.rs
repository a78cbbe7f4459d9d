#[cfg(feature = "mock")]
mod mock_tests {
    use album_expander::{
        merge, CatalogClient, CatalogError, ExpandSettings, FetchOptions, MockCatalogClient, Page,
        Result, TrackRecord,
    };
    use mockall::predicate::*; // for eq(), always(), etc.
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_get_album() -> Result<()> {
        let mut mock_client = MockCatalogClient::new();

        mock_client
            .expect_get_album()
            .with(eq("abc"), always())
            .times(1)
            .returning(|id, _| Ok(json!({"id": id, "name": "Mocked", "label": null})));

        // Use the mock as a trait object
        let client: &dyn CatalogClient = &mock_client;
        let album = client.get_album("abc", &FetchOptions::default()).await?;

        assert_eq!(album["id"], "abc");
        assert_eq!(album["name"], "Mocked");
        assert!(album["label"].is_null());
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_expand_album() -> Result<()> {
        let mut mock_client = MockCatalogClient::new();

        mock_client
            .expect_get_album()
            .returning(|id, _| Ok(json!({"id": id, "name": "Split EP", "album_type": "single"})));
        mock_client
            .expect_get_album_tracks_page()
            .times(1)
            .returning(|_, _, _, _| {
                Ok(Page::complete(vec![
                    json!({"name": "A", "artists": [{"name": "One"}], "disc_number": 1, "track_number": 1}),
                    json!({"name": "B", "artists": [{"name": "Two"}], "disc_number": 1, "track_number": 2}),
                ]))
            });
        mock_client.expect_get_artist().times(0);

        let settings = ExpandSettings {
            hydrate_tracks: false,
            ..ExpandSettings::default()
        };
        let enriched = album_expander::server::expand(
            &mock_client,
            &settings,
            "abc",
            &FetchOptions::default(),
        )
        .await?;

        assert!(enriched.tags.complication);
        assert_eq!(enriched.tags.compilation, None);
        assert_eq!(enriched.tags.disc_total, 1);
        assert_eq!(enriched.tags.copyright, album_expander::UNKNOWN);
        assert_eq!(enriched.tracks().len(), 2);

        let first = TrackRecord::from_value(&enriched.tracks()[0])?;
        assert!(!merge::is_complication(&[first]));
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_error_propagates() {
        let mut mock_client = MockCatalogClient::new();

        mock_client.expect_get_album().returning(|_, _| {
            Err(CatalogError::Upstream {
                status: 404,
                body: "{}".to_string(),
                content_type: None,
            })
        });

        let client: &dyn CatalogClient = &mock_client;
        let err = client
            .get_album("abc", &FetchOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
