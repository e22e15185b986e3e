use super::*;
use crate::test_util::{create_test_store, file_names, image_bytes, png_bytes};
use crate::types::MIN_EXPIRATION_SECS;

/// Header of a 1x1 GIF. Not decodable, but GIFs are stored without decoding.
const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00";

mod write_plain {
    use super::*;

    #[test]
    fn test_round_trip_is_byte_exact() {
        let (store, _sink, _temp) = create_test_store();
        let content = b"first line\nsecond \xff line\n".to_vec();

        let id = store
            .write_plain(Some("127.0.0.1"), &content, 0, Some(Syntax::new("rust".to_string())))
            .unwrap();

        let paste = store.read_plain_by_identifier(&id).unwrap().unwrap();
        assert_eq!(paste.id, id);
        assert_eq!(paste.raw_content, content);
        assert_eq!(paste.source_address.as_deref(), Some("127.0.0.1"));
        assert_eq!(paste.syntax.as_deref().map(String::as_str), Some("rust"));
        assert_eq!(paste.content_lossy(), "first line\nsecond  line\n");
    }

    #[test]
    fn test_zero_length_content_is_persisted() {
        let (store, _sink, _temp) = create_test_store();

        let id = store.write_plain(None, b"", 0, None).unwrap();

        let paste = store.read_plain_by_identifier(&id).unwrap().unwrap();
        assert!(paste.raw_content.is_empty());
    }

    #[test]
    fn test_non_expiring_paste_has_no_infix() {
        let (store, _sink, _temp) = create_test_store();

        let id = store.write_plain(None, b"x", 0, None).unwrap();
        assert_eq!(file_names(store.data_dir()), vec![format!("{id}.paste")]);
    }

    #[test]
    fn test_expiring_paste_carries_infix() {
        let (store, _sink, _temp) = create_test_store();

        let id = store
            .write_plain(None, b"x", MIN_EXPIRATION_SECS, None)
            .unwrap();
        assert_eq!(file_names(store.data_dir()), vec![format!("{id}.expires.paste")]);

        let paste = store.read_plain_by_identifier(&id).unwrap().unwrap();
        assert_eq!(paste.expiration_secs, MIN_EXPIRATION_SECS);
    }

    #[test]
    fn test_each_write_gets_a_fresh_identifier() {
        let (store, _sink, _temp) = create_test_store();

        let a = store.write_plain(None, b"same", 0, None).unwrap();
        let b = store.write_plain(None, b"same", 0, None).unwrap();
        assert_ne!(a, b);
        assert_eq!(file_names(store.data_dir()).len(), 2);
    }
}

mod write_image {
    use super::*;

    #[test]
    fn test_png_is_sanitized_and_stored_with_png_extension() {
        let (store, _sink, _temp) = create_test_store();

        let record = store.write_image(Some("::1"), &png_bytes(), 0).unwrap();

        assert_eq!(record.mime_type, "image/png");
        assert_eq!(record.file_name, format!("{}.png", record.id));
        assert_eq!(record.file_path, store.data_dir().join(&record.file_name));
        assert_eq!(record.source_address.as_deref(), Some("::1"));
        let stored = std::fs::read(&record.file_path).unwrap();
        assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_jpeg_keeps_jpeg_encoding() {
        let (store, _sink, _temp) = create_test_store();

        let record = store
            .write_image(None, &image_bytes(8, 8, ImageFormat::Jpeg), 60)
            .unwrap();

        assert_eq!(record.mime_type, "image/jpeg");
        assert_eq!(record.file_name, format!("{}.expires.jpg", record.id));
        assert_eq!(record.expiration_secs, 60);
    }

    #[test]
    fn test_expiring_image_gets_a_sidecar() {
        let (store, sink, _temp) = create_test_store();

        let record = store.write_image(None, &png_bytes(), 600).unwrap();

        assert_eq!(
            file_names(store.data_dir()),
            vec![
                format!("{}.expires.meta", record.id),
                format!("{}.expires.png", record.id),
            ]
        );
        let meta = store.data_dir().join(format!("{}.expires.meta", record.id));
        assert_eq!(store.read_image_meta(&meta).unwrap(), record);
        // Lookup still lands on the image itself.
        assert_eq!(
            store.find_by_identifier(&record.id).unwrap(),
            Some(record.file_path.clone())
        );
        assert!(store.read_image_by_identifier(&record.id).unwrap().is_some());
        assert!(sink.reports().is_empty());
    }

    #[test]
    fn test_sidecar_naming_another_item_is_corrupt() {
        let (store, _sink, _temp) = create_test_store();
        let record = store.write_image(None, &png_bytes(), 600).unwrap();
        let stranger = store.data_dir().join(format!("{}.expires.meta", ItemId::generate()));
        std::fs::write(&stranger, codec::encode_image_meta(&record).unwrap()).unwrap();

        assert!(matches!(
            store.read_image_meta(&stranger),
            Err(StoreError::CorruptRecord {
                source: CodecError::InvalidReference(_),
                ..
            })
        ));
    }

    #[test]
    fn test_non_expiring_image_has_no_sidecar() {
        let (store, _sink, _temp) = create_test_store();

        let record = store.write_image(None, &png_bytes(), 0).unwrap();
        assert_eq!(file_names(store.data_dir()), vec![record.file_name]);
    }

    #[test]
    fn test_gif_is_stored_verbatim() {
        let (store, _sink, _temp) = create_test_store();
        let record = store.write_image(None, GIF, 0).unwrap();

        assert_eq!(record.mime_type, "image/gif");
        assert_eq!(std::fs::read(&record.file_path).unwrap(), GIF);
    }

    #[test]
    fn test_oversized_image_is_downsized() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut config = crate::test_util::test_config(&temp);
        config.image_bounds = crate::types::ImageBounds { width: 16, height: 9 };
        let store = Store::open(&config, Arc::new(crate::core::sink::TracingSink)).unwrap();

        let record = store
            .write_image(None, &image_bytes(64, 32, ImageFormat::Png), 0)
            .unwrap();

        let stored = image::open(&record.file_path).unwrap();
        assert_eq!((stored.width(), stored.height()), (16, 8));
    }

    #[test]
    fn test_text_is_rejected_before_any_write() {
        let (store, _sink, _temp) = create_test_store();

        let result = store.write_image(None, b"just some text", 0);

        assert!(matches!(result, Err(StoreError::InvalidMimeType(_))));
        assert!(file_names(store.data_dir()).is_empty());
    }

    #[test]
    fn test_broken_png_is_rejected_before_any_write() {
        let (store, _sink, _temp) = create_test_store();

        let result = store.write_image(None, b"\x89PNG\r\n\x1a\nbroken", 0);

        assert!(matches!(result, Err(StoreError::Sanitize(_))));
        assert!(file_names(store.data_dir()).is_empty());
    }
}

mod write_album {
    use super::*;

    #[test]
    fn test_album_lists_images_in_order() {
        let (store, _sink, _temp) = create_test_store();
        let images = [png_bytes(), GIF.to_vec()];

        let id = store.write_album(None, &images, 0).unwrap();

        let album = store.read_album_by_identifier(&id).unwrap().unwrap();
        assert_eq!(album.len(), 2);
        assert_eq!(album[0].mime_type, "image/png");
        assert_eq!(album[1].mime_type, "image/gif");
        assert!(file_names(store.data_dir()).contains(&format!("{id}.album")));
    }

    #[test]
    fn test_invalid_image_is_left_out() {
        let (store, _sink, _temp) = create_test_store();
        let images: Vec<Vec<u8>> = vec![png_bytes(), b"not an image".to_vec()];

        let id = store.write_album(None, images, 3600).unwrap();

        let album = store.read_album_by_identifier(&id).unwrap().unwrap();
        assert_eq!(album.len(), 1);
        assert_eq!(album[0].mime_type, "image/png");
        // One image plus the album.
        assert_eq!(file_names(store.data_dir()).len(), 2);
    }

    #[test]
    fn test_no_valid_image_fails_without_album_file() {
        let (store, _sink, _temp) = create_test_store();
        let images: [&[u8]; 2] = [b"text", b""];

        let result = store.write_album(None, images, 0);

        assert!(matches!(result, Err(StoreError::NoContent)));
        assert!(file_names(store.data_dir()).is_empty());
    }

    #[test]
    fn test_empty_input_fails_with_no_content() {
        let (store, _sink, _temp) = create_test_store();

        let result = store.write_album(None, Vec::<Vec<u8>>::new(), 0);
        assert!(matches!(result, Err(StoreError::NoContent)));
    }

    #[test]
    fn test_expiring_album_marks_album_and_images() {
        let (store, _sink, _temp) = create_test_store();

        let id = store.write_album(None, [png_bytes()], 600).unwrap();

        let album = store.read_album_by_identifier(&id).unwrap().unwrap();
        let names = file_names(store.data_dir());
        assert!(names.contains(&format!("{id}.expires.album")));
        assert!(names.contains(&format!("{}.expires.png", album[0].id)));
        assert_eq!(album[0].expiration_secs, 600);
    }
}

mod read {
    use super::*;

    #[test]
    fn test_never_written_identifier_is_not_found() {
        let (store, sink, _temp) = create_test_store();
        let id = ItemId::generate();

        assert!(store.find_by_identifier(&id).unwrap().is_none());
        assert!(store.read_plain_by_identifier(&id).unwrap().is_none());
        assert!(store.read_album_by_identifier(&id).unwrap().is_none());
        assert!(store.read_image_by_identifier(&id).unwrap().is_none());
        assert!(sink.reports().is_empty());
    }

    #[test]
    fn test_find_locates_any_kind() {
        let (store, _sink, _temp) = create_test_store();
        let paste = store.write_plain(None, b"p", 5, None).unwrap();
        let image = store.write_image(None, &png_bytes(), 0).unwrap();
        let album = store.write_album(None, [png_bytes()], 0).unwrap();

        assert!(store.find_by_identifier(&paste).unwrap().is_some());
        assert_eq!(
            store.find_by_identifier(&image.id).unwrap(),
            Some(image.file_path.clone())
        );
        assert!(store.find_by_identifier(&album).unwrap().is_some());
    }

    #[test]
    fn test_image_read_sniffs_mime_type() {
        let (store, _sink, _temp) = create_test_store();
        let record = store.write_image(None, &png_bytes(), 0).unwrap();

        let image = store.read_image_by_identifier(&record.id).unwrap().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, std::fs::read(&record.file_path).unwrap());
    }

    #[test]
    fn test_reading_with_wrong_kind_is_a_miss() {
        let (store, sink, _temp) = create_test_store();
        let paste = store.write_plain(None, b"p", 0, None).unwrap();
        let album = store.write_album(None, [png_bytes()], 0).unwrap();

        assert!(store.read_album_by_identifier(&paste).unwrap().is_none());
        assert!(store.read_image_by_identifier(&paste).unwrap().is_none());
        assert!(store.read_plain_by_identifier(&album).unwrap().is_none());
        assert!(sink.reports().is_empty());
    }

    #[test]
    fn test_corrupt_paste_is_reported_and_treated_as_missing() {
        let (store, sink, _temp) = create_test_store();
        let id = ItemId::generate();
        let path = store.data_dir().join(format!("{id}.paste"));
        std::fs::write(&path, b"no separator here").unwrap();

        assert!(matches!(
            store.read_plain(&path),
            Err(StoreError::CorruptRecord { .. })
        ));
        assert!(store.read_plain_by_identifier(&id).unwrap().is_none());

        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].contains("Missing header separator"), "{reports:?}");
    }

    #[test]
    fn test_corrupt_album_is_reported_and_treated_as_missing() {
        let (store, sink, _temp) = create_test_store();
        let id = ItemId::generate();
        std::fs::write(store.data_dir().join(format!("{id}.album")), b"[{").unwrap();

        assert!(store.read_album_by_identifier(&id).unwrap().is_none());
        assert_eq!(sink.reports().len(), 1);
    }

    #[test]
    fn test_album_escaping_data_dir_is_corrupt() {
        let (store, sink, _temp) = create_test_store();
        let id = ItemId::generate();
        let document = format!(
            r#"[{{"expiration":0,"filename":"../../etc/passwd","filepath":"/etc/passwd","ip":null,"mimetype":"image/png","uid":"{id}"}}]"#
        );
        let path = store.data_dir().join(format!("{id}.album"));
        std::fs::write(&path, document).unwrap();

        assert!(matches!(
            store.read_album(&path),
            Err(StoreError::CorruptRecord {
                source: CodecError::InvalidReference(_),
                ..
            })
        ));
        assert!(store.read_album_by_identifier(&id).unwrap().is_none());
        assert_eq!(sink.reports().len(), 1);
    }

    #[test]
    fn test_read_of_deleted_path_is_not_found() {
        let (store, _sink, _temp) = create_test_store();
        let path = store.data_dir().join(format!("{}.paste", ItemId::generate()));

        assert!(matches!(store.read_plain(&path), Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.read_image_bytes(&path),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_custom_resolver_is_used() {
        struct Nowhere;
        impl Resolver for Nowhere {
            fn resolve(&self, _id: &ItemId) -> Result<Option<PathBuf>, StoreError> {
                Ok(None)
            }
        }

        let (store, _sink, _temp) = create_test_store();
        let store = Arc::into_inner(store).unwrap().with_resolver(Nowhere);
        let id = store.write_plain(None, b"hidden", 0, None).unwrap();

        assert!(store.read_plain_by_identifier(&id).unwrap().is_none());
    }
}
