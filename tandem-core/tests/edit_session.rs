mod support;

use std::time::Duration;

use anyhow::Result;
use image::GenericImageView;
use tandem_contracts::prelude::{
    CameraError, PermissionState, ProfileServiceError, StorageError,
};
use tandem_core::infra::{InMemoryProfileService, ProfileUpdate};
use tandem_core::{EditError, EditPhase, FlowOutcome, OperationKind, SaveStatus};
use tandem_model::{
    CapturedImage, CropRegion, ImageFormat, Platform, StudyLanguage, ToastKind,
    ToastPosition, UserProfile,
};

use support::{Harness, PNG_BYTES, UID, png_capture, sample_profile, solid_png, wait_until};

fn assert_idle(harness: &Harness) {
    assert!(!harness.session.is_loading());
    assert_eq!(harness.session.phase(), EditPhase::Idle);
}

#[tokio::test]
async fn open_adopts_profile_and_subscribes() -> Result<()> {
    let harness = Harness::opened().await;

    assert_eq!(harness.session.profile(), Some(sample_profile()));
    assert!(harness.session.is_subscribed());
    assert_eq!(harness.profiles.receiver_count(), 1);

    let snapshot = harness.session.snapshot();
    assert_eq!(snapshot.about_draft, "Hola!");
    assert!(!snapshot.about_save_enabled);
    assert_eq!(snapshot.save_status, SaveStatus::Synced);
    assert!(!snapshot.is_loading && !snapshot.closed);
    assert!(harness.toasts().is_empty());
    Ok(())
}

#[tokio::test]
async fn open_without_user_fails_and_releases_guard() {
    let harness = Harness::new(InMemoryProfileService::signed_out());

    let err = harness.session.open().await.unwrap_err();
    assert!(matches!(err, EditError::Load(ProfileServiceError::NotSignedIn)));
    assert_idle(&harness);
    assert_eq!(harness.session.profile(), None);
}

#[tokio::test]
async fn photo_action_before_open_needs_profile() {
    let harness = Harness::new(InMemoryProfileService::new(sample_profile()));
    harness.camera.push(Ok(png_capture()));

    let err = harness.session.add_other_photo().await.unwrap_err();
    assert!(matches!(err, EditError::ProfileNotLoaded));
    assert_eq!(harness.camera.calls(), 0);
}

#[tokio::test]
async fn add_photo_appends_uploaded_url_and_persists() -> Result<()> {
    let harness = Harness::opened().await;
    harness.camera.push(Ok(png_capture()));

    let outcome = harness.session.add_other_photo().await?;
    assert_eq!(outcome, FlowOutcome::Saved);

    let url = harness.uploaded_url(ImageFormat::Png);
    let profile = harness.session.profile().expect("profile");
    assert_eq!(profile.other_photos, vec!["a.png".to_string(), url.clone()]);

    let writes = harness.profiles.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].update, ProfileUpdate::OtherPhotos);
    assert_eq!(writes[0].profile.other_photos.last(), Some(&url));

    let (bytes, content_type) = harness
        .storage
        .inner
        .get(&format!("users/{UID}/1700000000000.png"))
        .expect("object uploaded");
    assert_eq!(bytes, PNG_BYTES);
    assert_eq!(content_type, "image/png");

    let toasts = harness.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].message, "Other Image Added.");
    assert_eq!(toasts[0].kind, ToastKind::Success);
    assert_eq!(toasts[0].duration.as_millis(), 1500);
    assert_eq!(toasts[0].position, ToastPosition::Bottom);

    assert_idle(&harness);
    assert_eq!(harness.session.save_status(), SaveStatus::Synced);
    Ok(())
}

#[tokio::test]
async fn change_photo_replaces_primary() -> Result<()> {
    let harness = Harness::opened().await;
    harness.camera.push(Ok(CapturedImage::new(
        tandem_core::data_url::encode("image/jpeg", b"jpeg-bytes"),
        ImageFormat::Jpeg,
        Platform::Native,
    )));

    harness.session.change_photo().await?;

    let url = harness.uploaded_url(ImageFormat::Jpeg);
    assert!(url.ends_with(".jpeg"));
    let profile = harness.session.profile().expect("profile");
    assert_eq!(profile.photo, url);
    assert_eq!(profile.other_photos, vec!["a.png"]);

    let writes = harness.profiles.writes();
    assert_eq!(writes[0].update, ProfileUpdate::ProfilePicture);
    assert_eq!(writes[0].profile.photo, url);
    assert_eq!(harness.toasts()[0].message, "Profile Picture Updated.");
    Ok(())
}

#[tokio::test]
async fn cancelled_capture_changes_nothing() -> Result<()> {
    let harness = Harness::opened().await;
    harness.camera.push(Err(CameraError::Cancelled));

    let outcome = harness.session.add_other_photo().await?;
    assert_eq!(outcome, FlowOutcome::NothingCaptured);

    assert_eq!(harness.session.profile(), Some(sample_profile()));
    assert!(harness.profiles.writes().is_empty());
    assert!(harness.storage.inner.is_empty());
    assert!(harness.toasts().is_empty());
    assert_idle(&harness);
    Ok(())
}

#[tokio::test]
async fn denied_permission_is_silent() -> Result<()> {
    let harness = Harness::opened().await;
    harness.camera.set_permission(PermissionState::Denied);
    harness.camera.push(Ok(png_capture()));

    let outcome = harness.session.change_photo().await?;
    assert_eq!(outcome, FlowOutcome::NothingCaptured);
    assert_eq!(harness.camera.calls(), 0);
    assert!(harness.toasts().is_empty());
    assert_idle(&harness);
    Ok(())
}

#[tokio::test]
async fn malformed_data_url_reports_error() {
    let harness = Harness::opened().await;
    harness.camera.push(Ok(CapturedImage::new(
        "data:image/png,not-base64",
        ImageFormat::Png,
        Platform::Native,
    )));

    let err = harness.session.add_other_photo().await.unwrap_err();
    assert!(matches!(err, EditError::MalformedEncoding(_)));
    assert!(err.is_user_visible());

    assert!(harness.storage.inner.is_empty());
    assert!(harness.profiles.writes().is_empty());
    let toasts = harness.toasts();
    assert_eq!(toasts.len(), 1);
    assert!(toasts[0].is_error());
    assert_eq!(toasts[0].message, "Could not read the selected image.");
    assert_idle(&harness);
}

#[tokio::test]
async fn upload_failure_leaves_profile_untouched() {
    let harness = Harness::opened().await;
    harness.storage.fail_puts(StorageError::QuotaExceeded);
    harness.camera.push(Ok(png_capture()));

    let err = harness.session.add_other_photo().await.unwrap_err();
    assert!(matches!(
        err,
        EditError::Upload {
            source: StorageError::QuotaExceeded,
            ..
        }
    ));

    assert_eq!(harness.session.profile(), Some(sample_profile()));
    assert!(harness.profiles.writes().is_empty());
    let toasts = harness.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].message, "Photo upload failed. Please try again.");
    assert_idle(&harness);
}

#[tokio::test]
async fn url_retrieval_failure_is_distinct() {
    let harness = Harness::opened().await;
    harness
        .storage
        .fail_urls(StorageError::Transport("connection reset".into()));
    harness.camera.push(Ok(png_capture()));

    let err = harness.session.change_photo().await.unwrap_err();
    assert!(matches!(err, EditError::Retrieval { .. }));
    assert_eq!(harness.session.profile(), Some(sample_profile()));
    assert!(harness.toasts()[0].is_error());
}

#[tokio::test]
async fn persist_failure_keeps_merge_and_marks_unsaved() {
    let harness = Harness::opened().await;
    harness
        .profiles
        .set_write_failure(Some(ProfileServiceError::Unavailable("offline".into())));
    harness.camera.push(Ok(png_capture()));

    let err = harness.session.add_other_photo().await.unwrap_err();
    assert!(matches!(err, EditError::Persistence(_)));

    let url = harness.uploaded_url(ImageFormat::Png);
    let profile = harness.session.profile().expect("profile");
    assert_eq!(profile.other_photos.last(), Some(&url));
    assert!(harness.session.save_status().is_unsaved());

    let toasts = harness.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].message, "Changes could not be saved. Please try again.");
    assert!(toasts[0].is_error());
    assert_idle(&harness);
}

#[tokio::test]
async fn second_trigger_while_running_is_busy() -> Result<()> {
    let harness = Harness::opened().await;
    let release = harness.camera.hold();
    harness.camera.push(Ok(png_capture()));

    let session = harness.session.clone();
    let running = tokio::spawn(async move { session.change_photo().await });

    let session = harness.session.clone();
    wait_until(|| session.is_loading()).await;
    assert_eq!(harness.session.phase(), EditPhase::Capturing);

    let err = harness.session.delete_language("fr").await.unwrap_err();
    assert!(matches!(
        err,
        EditError::Busy {
            running: OperationKind::ChangePhoto
        }
    ));
    assert!(matches!(
        harness.session.add_other_photo().await,
        Err(EditError::Busy { .. })
    ));
    assert_eq!(
        harness.session.profile().expect("profile").study_languages.len(),
        2
    );

    release.notify_one();
    assert_eq!(running.await??, FlowOutcome::Saved);
    assert_idle(&harness);
    assert_eq!(harness.camera.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn delete_language_filters_both_lists() -> Result<()> {
    let harness = Harness::opened().await;

    harness.session.delete_language("fr").await?;

    let profile = harness.session.profile().expect("profile");
    assert_eq!(profile.study_languages, vec![StudyLanguage::new("en", "English")]);
    assert_eq!(profile.languages_array, vec!["en"]);

    let writes = harness.profiles.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].update, ProfileUpdate::StudyLanguages);
    assert_eq!(writes[0].profile.study_languages.len(), 1);
    assert_eq!(harness.toasts()[0].message, "Language deleted.");
    Ok(())
}

#[tokio::test]
async fn deleting_absent_entries_still_persists() -> Result<()> {
    let harness = Harness::opened().await;

    harness.session.delete_other_photo("never-there.png").await?;
    harness.session.delete_language("de").await?;

    let profile = harness.session.profile().expect("profile");
    assert_eq!(profile.other_photos, sample_profile().other_photos);
    assert_eq!(profile.study_languages, sample_profile().study_languages);

    let updates: Vec<_> = harness
        .profiles
        .writes()
        .into_iter()
        .map(|write| write.update)
        .collect();
    assert_eq!(
        updates,
        vec![ProfileUpdate::OtherPhotos, ProfileUpdate::StudyLanguages]
    );
    Ok(())
}

#[tokio::test]
async fn delete_other_photo_removes_entry() -> Result<()> {
    let harness = Harness::opened().await;

    let outcome = harness.session.delete_other_photo("a.png").await?;
    assert_eq!(outcome, FlowOutcome::Saved);
    assert!(harness.session.profile().expect("profile").other_photos.is_empty());
    assert_eq!(harness.toasts()[0].message, "Other Image Deleted.");
    Ok(())
}

#[tokio::test]
async fn primary_photo_cannot_be_deleted() {
    let harness = Harness::opened().await;

    let outcome = harness.session.delete_primary_photo().await;
    assert_eq!(outcome.ok(), Some(FlowOutcome::Refused));

    assert!(harness.profiles.writes().is_empty());
    let toasts = harness.toasts();
    assert_eq!(toasts[0].kind, ToastKind::Info);
    assert_eq!(toasts[0].message, "At least one profile picture required.");
}

#[tokio::test]
async fn primary_photo_delete_after_close_is_rejected() {
    let harness = Harness::opened().await;
    harness.session.close().await;

    assert!(matches!(
        harness.session.delete_primary_photo().await,
        Err(EditError::Closed)
    ));
    assert!(harness.toasts().is_empty());
}

#[tokio::test]
async fn unchanged_about_me_is_not_saved() -> Result<()> {
    let harness = Harness::opened().await;

    assert_eq!(harness.session.save_about_me().await?, FlowOutcome::Refused);
    assert!(!harness.session.input_about_me("Hola!")?);
    assert_eq!(harness.session.save_about_me().await?, FlowOutcome::Refused);

    assert!(harness.profiles.writes().is_empty());
    assert!(harness.toasts().is_empty());
    assert_idle(&harness);
    Ok(())
}

#[tokio::test]
async fn about_me_save_tracks_stored_value() -> Result<()> {
    let harness = Harness::opened().await;

    assert!(!harness.session.input_about_me("Hola!")?);
    assert!(harness.session.input_about_me("Bonjour")?);
    assert!(harness.session.snapshot().about_save_enabled);
    assert_eq!(harness.session.snapshot().about_draft, "Bonjour");

    harness.session.save_about_me().await?;

    let writes = harness.profiles.writes();
    assert_eq!(writes[0].update, ProfileUpdate::About);
    assert_eq!(writes[0].profile.about_me, "Bonjour");
    assert_eq!(harness.toasts()[0].message, "About me saved.");
    assert!(!harness.session.snapshot().about_save_enabled);

    // The saved text is now the baseline.
    assert!(!harness.session.input_about_me("Bonjour")?);
    assert!(harness.session.input_about_me("Hola!")?);
    Ok(())
}

#[tokio::test]
async fn remote_snapshot_replaces_working_copy() {
    let harness = Harness::opened().await;
    harness.session.input_about_me("draft").expect("input");

    let mut remote = sample_profile();
    remote.about_me = "edited on another device".into();
    remote.other_photos.push("b.png".into());
    harness.profiles.publish_remote(remote.clone());

    let session = harness.session.clone();
    wait_until(|| session.profile().as_ref() == Some(&remote)).await;

    let snapshot = harness.session.snapshot();
    assert_eq!(snapshot.about_draft, "edited on another device");
    assert!(!snapshot.about_save_enabled);
}

#[tokio::test]
async fn unsaved_changes_survive_remote_snapshot() -> Result<()> {
    let harness = Harness::opened().await;
    harness
        .profiles
        .set_write_failure(Some(ProfileServiceError::Unavailable("offline".into())));
    harness.camera.push(Ok(png_capture()));
    assert!(harness.session.add_other_photo().await.is_err());
    let url = harness.uploaded_url(ImageFormat::Png);

    let mut remote = sample_profile();
    remote.display_name = "Renamed elsewhere".into();
    harness.profiles.publish_remote(remote);

    let session = harness.session.clone();
    wait_until(|| {
        session
            .profile()
            .is_some_and(|p| p.display_name == "Renamed elsewhere")
    })
    .await;

    let profile = harness.session.profile().expect("profile");
    assert_eq!(profile.other_photos, vec!["a.png".to_string(), url.clone()]);
    assert!(harness.session.save_status().is_unsaved());

    // The next successful write carries the replayed photo and clears the flag.
    harness.profiles.set_write_failure(None);
    harness.session.delete_language("fr").await?;

    let writes = harness.profiles.writes();
    let written = &writes.last().expect("write").profile;
    assert_eq!(written.display_name, "Renamed elsewhere");
    assert!(written.other_photos.contains(&url));
    assert_eq!(harness.session.save_status(), SaveStatus::Synced);
    Ok(())
}

#[tokio::test]
async fn dropping_session_without_close_unsubscribes() {
    let harness = Harness::opened().await;
    let profiles = harness.profiles.clone();
    assert_eq!(profiles.receiver_count(), 1);

    drop(harness);

    wait_until(|| profiles.receiver_count() == 0).await;
}

#[tokio::test]
async fn dropped_flow_future_frees_the_slot() -> Result<()> {
    let harness = Harness::opened().await;
    let _parked = harness.camera.hold();
    harness.camera.push(Ok(png_capture()));

    {
        let flow = harness.session.add_other_photo();
        tokio::pin!(flow);
        let polled =
            tokio::time::timeout(Duration::from_millis(50), &mut flow).await;
        assert!(polled.is_err());
        assert!(harness.session.is_loading());
        assert_eq!(harness.session.phase(), EditPhase::Capturing);
    }

    assert_idle(&harness);
    assert_eq!(harness.session.profile(), Some(sample_profile()));
    assert_eq!(
        harness.session.delete_language("en").await?,
        FlowOutcome::Saved
    );
    Ok(())
}

#[tokio::test]
async fn close_stops_listening_and_rejects_actions() {
    let harness = Harness::opened().await;
    assert_eq!(harness.profiles.receiver_count(), 1);

    harness.session.close().await;
    harness.session.close().await;

    assert!(!harness.session.is_subscribed());
    assert_eq!(harness.profiles.receiver_count(), 0);

    let mut remote = sample_profile();
    remote.about_me = "too late".into();
    harness.profiles.publish_remote(remote);
    tokio::task::yield_now().await;
    assert_eq!(harness.session.profile(), Some(sample_profile()));

    assert!(matches!(
        harness.session.change_photo().await,
        Err(EditError::Closed)
    ));
    assert!(matches!(
        harness.session.input_about_me("x"),
        Err(EditError::Closed)
    ));
    assert!(harness.session.snapshot().closed);
}

#[tokio::test]
async fn close_during_upload_discards_result() -> Result<()> {
    let harness = Harness::opened().await;
    let release = harness.storage.hold();
    harness.camera.push(Ok(png_capture()));

    let session = harness.session.clone();
    let running = tokio::spawn(async move { session.add_other_photo().await });

    let session = harness.session.clone();
    wait_until(|| session.phase() == EditPhase::Uploading).await;
    harness.session.close().await;
    release.notify_one();

    assert_eq!(running.await??, FlowOutcome::Discarded);
    assert_eq!(harness.session.profile(), Some(sample_profile()));
    assert!(harness.profiles.writes().is_empty());
    assert!(harness.toasts().is_empty());
    assert_idle(&harness);
    Ok(())
}

#[tokio::test]
async fn crop_region_is_applied_before_upload() -> Result<()> {
    let harness = Harness::opened().await;
    let png = solid_png(8, 6);
    harness.camera.push(Ok(CapturedImage::new(
        tandem_core::data_url::encode("image/png", &png),
        ImageFormat::Png,
        Platform::Native,
    )
    .with_crop(CropRegion::new(2, 1, 4, 3)?)));

    harness.session.add_other_photo().await?;

    let (bytes, _) = harness
        .storage
        .inner
        .get("users/u1/1700000000000.png")
        .expect("uploaded");
    let cropped = image::load_from_memory(&bytes)?;
    assert_eq!(cropped.dimensions(), (4, 3));
    Ok(())
}

#[tokio::test]
async fn crop_outside_image_is_reported() {
    let harness = Harness::opened().await;
    harness.camera.push(Ok(CapturedImage::new(
        tandem_core::data_url::encode("image/png", &solid_png(4, 4)),
        ImageFormat::Png,
        Platform::Native,
    )
    .with_crop(CropRegion::new(10, 10, 2, 2).expect("region"))));

    let err = harness.session.add_other_photo().await.unwrap_err();
    assert!(matches!(err, EditError::Crop(_)));
    assert!(harness.storage.inner.is_empty());
    assert_eq!(harness.toasts()[0].message, "Could not read the selected image.");
}

#[tokio::test]
async fn photo_owner_falls_back_to_signed_in_user() -> Result<()> {
    // Document without a uid field, as older records were written.
    let profiles = InMemoryProfileService::new(UserProfile::new(UID));
    profiles.publish_remote(UserProfile::default());
    let harness = Harness::new(profiles);
    harness.session.open().await?;
    harness.camera.push(Ok(png_capture()));

    // Upload path uses the auth uid; the write itself is rejected because the
    // document does not carry it, which surfaces as a persistence failure.
    let err = harness.session.add_other_photo().await.unwrap_err();
    assert!(matches!(err, EditError::Persistence(_)));
    assert!(
        harness
            .storage
            .inner
            .get("users/u1/1700000000000.png")
            .is_some()
    );
    Ok(())
}
