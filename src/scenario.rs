// Driving scenario records
//
// Message types mirror the field tags of the Waymo Open Motion `Scenario`
// schema. Only the fields egoplot reads are declared, prost skips the rest
// (map features, dynamic map states, lidar data) while decoding.

use prost::Message;

use crate::errors::EgoPlotError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ObjectType {
    Unset = 0,
    Vehicle = 1,
    Pedestrian = 2,
    Cyclist = 3,
    Other = 4,
}

/// One time step of an agent
#[derive(Clone, PartialEq, Message)]
pub struct ObjectState {
    /// Global coordinates of the bounding box center, meters
    #[prost(double, tag = "2")]
    pub center_x: f64,
    #[prost(double, tag = "3")]
    pub center_y: f64,
    #[prost(double, tag = "4")]
    pub center_z: f64,
    /// Bounding box dimensions, meters
    #[prost(float, tag = "5")]
    pub length: f32,
    #[prost(float, tag = "6")]
    pub width: f32,
    #[prost(float, tag = "7")]
    pub height: f32,
    /// Heading in radians
    #[prost(float, tag = "8")]
    pub heading: f32,
    /// Velocity in m/s
    #[prost(float, tag = "9")]
    pub velocity_x: f32,
    #[prost(float, tag = "10")]
    pub velocity_y: f32,
    /// Whether the other fields of this state hold real data
    #[prost(bool, tag = "11")]
    pub valid: bool,
}

impl ObjectState {
    /// Valid state at the given position, other fields zeroed
    pub fn at(center_x: f64, center_y: f64) -> Self {
        Self {
            center_x,
            center_y,
            valid: true,
            ..Default::default()
        }
    }
}

/// Time series of states for one agent
#[derive(Clone, PartialEq, Message)]
pub struct Track {
    #[prost(int32, tag = "1")]
    pub id: i32,
    #[prost(enumeration = "ObjectType", tag = "2")]
    pub object_type: i32,
    #[prost(message, repeated, tag = "3")]
    pub states: Vec<ObjectState>,
}

impl Track {
    /// States with the validity flag set, in stored (time) order
    pub fn valid_states(&self) -> impl Iterator<Item = &ObjectState> {
        self.states.iter().filter(|state| state.valid)
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct Scenario {
    #[prost(double, repeated, packed = "false", tag = "1")]
    pub timestamps_seconds: Vec<f64>,
    #[prost(message, repeated, tag = "2")]
    pub tracks: Vec<Track>,
    #[prost(int32, repeated, packed = "false", tag = "4")]
    pub objects_of_interest: Vec<i32>,
    #[prost(string, tag = "5")]
    pub scenario_id: String,
    /// Index into `tracks` of the self-driving car
    #[prost(int32, tag = "6")]
    pub sdc_track_index: i32,
    #[prost(int32, tag = "10")]
    pub current_time_index: i32,
}

impl Scenario {
    /// Decode one record payload. `record_no` is only used for error reporting.
    pub fn from_record(record_no: usize, payload: &[u8]) -> Result<Self, EgoPlotError> {
        Scenario::decode(payload).map_err(|e| EgoPlotError::ScenarioDecode {
            record_no,
            source: e,
        })
    }

    /// Number of agents in the scenario, ego included
    pub fn agent_count(&self) -> usize {
        self.tracks.len()
    }

    /// The ego vehicle track selected by `sdc_track_index`
    pub fn ego_track(&self) -> Result<&Track, EgoPlotError> {
        usize::try_from(self.sdc_track_index)
            .ok()
            .and_then(|index| self.tracks.get(index))
            .ok_or_else(|| EgoPlotError::EgoTrackIndexOutOfRange {
                scenario_id: self.scenario_id.clone(),
                index: self.sdc_track_index as i64,
                track_count: self.tracks.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: i32, states: Vec<ObjectState>) -> Track {
        Track {
            id,
            object_type: ObjectType::Vehicle as i32,
            states,
        }
    }

    #[test]
    fn test_decode_round_trip_keeps_ego_fields() {
        let scenario = Scenario {
            scenario_id: "637f20cafde22ff8".to_string(),
            sdc_track_index: 1,
            tracks: vec![
                track(10, vec![ObjectState::at(1.0, 2.0)]),
                track(11, vec![ObjectState::at(3.0, 4.0), ObjectState::default()]),
            ],
            timestamps_seconds: vec![0.0, 0.1],
            ..Default::default()
        };
        let decoded = Scenario::from_record(0, &scenario.encode_to_vec()).unwrap();
        assert_eq!(decoded, scenario);
        assert_eq!(decoded.ego_track().unwrap().id, 11);
        assert_eq!(decoded.agent_count(), 2);
    }

    #[test]
    fn test_unset_ego_index_defaults_to_first_track() {
        let scenario = Scenario {
            scenario_id: "a".to_string(),
            tracks: vec![track(7, Vec::new()), track(8, Vec::new())],
            ..Default::default()
        };
        let decoded = Scenario::from_record(0, &scenario.encode_to_vec()).unwrap();
        assert_eq!(decoded.ego_track().unwrap().id, 7);
    }

    #[test]
    fn test_ego_index_out_of_range() {
        let scenario = Scenario {
            scenario_id: "b".to_string(),
            sdc_track_index: 2,
            tracks: vec![track(1, Vec::new()), track(2, Vec::new())],
            ..Default::default()
        };
        match scenario.ego_track() {
            Err(EgoPlotError::EgoTrackIndexOutOfRange {
                index, track_count, ..
            }) => {
                assert_eq!(index, 2);
                assert_eq!(track_count, 2);
            }
            other => panic!("Expected EgoTrackIndexOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_ego_index_is_out_of_range() {
        let scenario = Scenario {
            sdc_track_index: -1,
            tracks: vec![track(1, Vec::new())],
            ..Default::default()
        };
        assert!(matches!(
            scenario.ego_track(),
            Err(EgoPlotError::EgoTrackIndexOutOfRange { index: -1, .. })
        ));
    }

    #[test]
    fn test_garbage_payload_fails_to_decode() {
        // field 2 declared as a length-delimited message longer than the buffer
        let payload = [0x12, 0x50, 0x01];
        assert!(matches!(
            Scenario::from_record(3, &payload),
            Err(EgoPlotError::ScenarioDecode { record_no: 3, .. })
        ));
    }

    #[test]
    fn test_valid_states_keep_stored_order() {
        let mut invalid = ObjectState::at(99.0, 99.0);
        invalid.valid = false;
        let track = track(
            1,
            vec![
                ObjectState::at(3.0, 0.0),
                invalid,
                ObjectState::at(1.0, 0.0),
                ObjectState::at(1.0, 0.0),
            ],
        );
        let xs: Vec<f64> = track.valid_states().map(|s| s.center_x).collect();
        assert_eq!(xs, vec![3.0, 1.0, 1.0]);
    }

    #[test]
    fn test_unknown_object_type_maps_to_unset() {
        let mut track = track(1, Vec::new());
        assert_eq!(track.object_type(), ObjectType::Vehicle);
        track.object_type = 42;
        assert_eq!(track.object_type(), ObjectType::Unset);
    }
}
