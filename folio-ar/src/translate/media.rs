//! Media (member object) metadata translation

use folio_common::Media;
use serde_json::json;

use super::ArchiveDocument;

/// Build the archive document for a media item.
///
/// Members carry their own small metadata set; descriptive metadata lives on
/// the container. The license is mandatory for members and is checked by the
/// controller before any push is enqueued.
pub fn build_media_document(media: &Media) -> ArchiveDocument {
    let mut doc = ArchiveDocument::new();

    doc.insert(
        "dce:title".to_string(),
        json!([{
            "@type": "bf:Title",
            "bf:mainTitle": [{"@value": media.original_filename, "@language": "und"}],
        }]),
    );
    doc.insert(
        "ebucore:filename".to_string(),
        json!([media.original_filename]),
    );
    doc.insert(
        "ebucore:hasMimeType".to_string(),
        json!([media.mime_type]),
    );

    if let Some(license) = &media.license {
        let rights = license.source.as_deref().unwrap_or(&license.label);
        doc.insert("edm:rights".to_string(), json!([rights]));
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use folio_common::{ArchiveStatus, Concept};
    use uuid::Uuid;

    fn media() -> Media {
        Media {
            guid: Uuid::new_v4(),
            entry_guid: Uuid::new_v4(),
            file_path: "/data/media/talk.mp4".to_string(),
            original_filename: "talk.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            license: Some(Concept::new(
                "https://creativecommons.org/licenses/by/4.0/",
                "CC BY 4.0",
            )),
            archive_id: None,
            archive_uri: None,
            archive_date: None,
            archive_status: ArchiveStatus::NotArchived,
            date_changed: Utc::now(),
        }
    }

    #[test]
    fn media_document_shape() {
        let doc = build_media_document(&media());

        assert_eq!(doc["ebucore:hasMimeType"][0], "video/mp4");
        assert_eq!(doc["ebucore:filename"][0], "talk.mp4");
        assert_eq!(
            doc["edm:rights"][0],
            "https://creativecommons.org/licenses/by/4.0/"
        );
        assert_eq!(doc["dce:title"][0]["bf:mainTitle"][0]["@value"], "talk.mp4");
    }

    #[test]
    fn missing_license_omits_rights() {
        let mut m = media();
        m.license = None;
        let doc = build_media_document(&m);
        assert!(!doc.contains_key("edm:rights"));
    }
}
