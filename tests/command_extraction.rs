use meshhelper::command::{extract, CommandKind, NO_COMMAND};
use meshhelper::geo::Coordinates;

#[test]
fn coordinate_values_parse_exactly_as_written() {
    for (text, lat, lon) in [
        ("CMD: 12.5, -45.25", 12.5, -45.25),
        ("CMD:12.5,-45.25", 12.5, -45.25),
        ("CMD: -0.001, 179.999", -0.001, 179.999),
        ("CMD: 7, 8", 7.0, 8.0),
    ] {
        let cmd = extract(text);
        assert_eq!(cmd.keyword, "CMD", "keyword for {:?}", text);
        assert_eq!(
            cmd.coordinates,
            Some(Coordinates::new(lat, lon)),
            "coordinates for {:?}",
            text
        );
    }
}

#[test]
fn bare_command_at_end_of_line() {
    let cmd = extract("CMD:");
    assert_eq!(cmd.keyword, "CMD");
    assert_eq!(cmd.coordinates, None);
}

#[test]
fn no_match_returns_sentinel() {
    for text in ["hello world", "", "   ", "Foo: hi there", ":", "12.5, 3"] {
        let cmd = extract(text);
        assert_eq!(cmd.keyword, NO_COMMAND, "for {:?}", text);
        assert!(cmd.coordinates.is_none());
    }
}

#[test]
fn command_on_a_later_line_is_found() {
    let cmd = extract("hi base\nSignal:\nthanks");
    assert_eq!(cmd.keyword, "Signal");
    assert_eq!(cmd.kind(), CommandKind::Signal);
}

#[test]
fn topmost_coordinate_line_wins() {
    let cmd = extract("Distance: 1, 2\nDistance: 3, 4");
    assert_eq!(cmd.coordinates, Some(Coordinates::new(1.0, 2.0)));
}

#[test]
fn coordinate_form_beats_earlier_bare_line() {
    let cmd = extract("Time:\nDistance: 10.5, 20.25");
    assert_eq!(cmd.keyword, "Distance");
    assert_eq!(cmd.coordinates, Some(Coordinates::new(10.5, 20.25)));
}

#[test]
fn coordinate_prefix_with_trailing_text_still_matches() {
    // Line-anchored at the start only
    let cmd = extract("Distance: 1.5, 2.5 please");
    assert_eq!(cmd.keyword, "Distance");
    assert_eq!(cmd.coordinates, Some(Coordinates::new(1.5, 2.5)));
}

#[test]
fn unknown_keyword_is_echo_kind() {
    assert_eq!(extract("Ping:").kind(), CommandKind::Echo);
    assert_eq!(extract("nothing here").kind(), CommandKind::Echo);
}
