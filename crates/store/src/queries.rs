//! SQL statements issued by the store. Every value is a bound `$n` parameter.

pub const INSERT_SEGMENT: &str = "INSERT INTO segments (name) VALUES ($1) RETURNING id";

pub const UPDATE_SEGMENT: &str = "UPDATE segments SET name = $1 WHERE id = $2";

pub const DELETE_SEGMENT: &str = "DELETE FROM segments WHERE id = $1";

pub const SELECT_SEGMENT: &str = "SELECT id, name FROM segments WHERE id = $1";

pub const INSERT_MEMBERSHIP: &str =
    "INSERT INTO user_segments (user_id, segment_id) VALUES ($1, $2)";

pub const DELETE_MEMBERSHIP: &str =
    "DELETE FROM user_segments WHERE user_id = $1 AND segment_id = $2";

pub const SELECT_USER_SEGMENTS: &str = "SELECT s.id, s.name FROM segments s \
     INNER JOIN user_segments us ON s.id = us.segment_id \
     WHERE us.user_id = $1";
