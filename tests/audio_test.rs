use flow_vignette::{
    audio::{BackgroundMusic, MusicState},
    input::PointerTracker,
};
use winit::event::MouseButton;

#[test]
fn first_click_creates_output_and_requests_track() {
    let mut music = BackgroundMusic::new("nobita/music.mp3", 0.3);
    assert_eq!(music.state(), MusicState::Idle);

    let action = music.on_click();
    assert!(action.create_output);
    let request = action.play.expect("first click plays");
    assert_eq!(request.track, "nobita/music.mp3");
    assert_eq!(request.volume, 0.3);
    assert!(request.looping);
    assert_eq!(music.state(), MusicState::Loading);
}

#[test]
fn clicks_while_loading_or_playing_do_nothing() {
    let mut music = BackgroundMusic::new("track.mp3", 0.5);
    music.on_click();
    let second = music.on_click();
    assert!(!second.create_output);
    assert!(second.play.is_none());

    music.on_started();
    assert_eq!(music.state(), MusicState::Playing);
    assert!(music.on_click().play.is_none());
    assert_eq!(music.requests(), 1);
}

#[test]
fn failed_track_can_be_retried() {
    let mut music = BackgroundMusic::new("track.mp3", 0.5);
    music.on_click();
    music.on_failed(&anyhow::anyhow!("blocked"));
    assert_eq!(music.state(), MusicState::Idle);

    let retry = music.on_click();
    assert!(!retry.create_output);
    assert!(retry.play.is_some());
    assert_eq!(music.requests(), 2);
}

#[test]
fn look_around_drag_starts_the_music_on_release() {
    let mut tracker = PointerTracker::new();
    let mut music = BackgroundMusic::new("nobita/music.mp3", 0.3);

    let mut gesture = tracker.moved(100.0, 100.0);
    gesture.extend(tracker.pressed(MouseButton::Left));
    gesture.extend(tracker.moved(150.0, 100.0));
    assert!(gesture.iter().all(|e| music.on_pointer(e).is_none()));
    assert_eq!(music.state(), MusicState::Idle);

    let actions: Vec<_> = tracker
        .released(MouseButton::Left)
        .iter()
        .filter_map(|e| music.on_pointer(e))
        .collect();
    assert_eq!(actions.len(), 1);
    assert!(actions[0].play.is_some());
    assert_eq!(music.state(), MusicState::Loading);
}
