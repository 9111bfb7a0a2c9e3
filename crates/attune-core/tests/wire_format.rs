//! Wire-contract checks: the rendered query expression, evaluated the way
//! AppleScript would (literal substitution of each field expression),
//! must decode back to the original mapping.

use attune_core::models::Track;
use attune_core::query::{parse_record, parse_records, QuerySpec, BR, EQ};
use attune_core::scripts;

/// Evaluate a rendered query expression against a value table, mimicking
/// the AppleScript `&` operator: quoted segments pass through, bare
/// expressions are looked up.
fn evaluate(rendered: &str, values: &[(&str, &str)]) -> String {
    rendered
        .split(" & ")
        .map(|part| {
            if let Some(literal) = part.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
                literal.to_string()
            } else {
                values
                    .iter()
                    .find(|(expr, _)| *expr == part)
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_default()
            }
        })
        .collect()
}

#[test]
fn rendered_query_survives_the_round_trip() {
    let rendered = QuerySpec::new()
        .field("id", "persistent ID")
        .field("name", "name")
        .field("artist", "artist")
        .render()
        .unwrap();
    let line = evaluate(
        &rendered,
        &[
            ("persistent ID", "ABC123"),
            ("name", "Hey Jude"),
            ("artist", "The Beatles"),
        ],
    );
    assert_eq!(line, "id<EQ>ABC123<BR>name<EQ>Hey Jude<BR>artist<EQ>The Beatles");

    let record = parse_record(&line);
    assert_eq!(record.get("id"), "ABC123");
    assert_eq!(record.get("name"), "Hey Jude");
    assert_eq!(record.get("artist"), "The Beatles");
}

#[test]
fn track_query_covers_every_coerced_field() {
    let rendered = scripts::track_query().render().unwrap();
    for field in [
        "id", "name", "artist", "album", "albumArtist", "genre", "dateAdded", "playedCount",
        "duration", "time", "year", "inLibrary", "favorited", "disliked", "rating",
    ] {
        assert!(
            rendered.contains(&format!("{field}{EQ}")),
            "track query is missing field {field:?}"
        );
    }
}

#[test]
fn batch_of_simulated_lines_decodes_in_order() {
    let raw = format!(
        "id{EQ}1{BR}name{EQ}First\nid{EQ}2{BR}name{EQ}Second\nid{EQ}3{BR}name{EQ}Third\n"
    );
    let tracks: Vec<Track> = parse_records(&raw).iter().map(Track::from_record).collect();
    assert_eq!(
        tracks.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
        ["1", "2", "3"]
    );
    assert_eq!(tracks[0].name, "First");
}
