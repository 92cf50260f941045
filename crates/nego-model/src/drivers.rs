//! Driver derivation: scenario counts and ratios to per-channel usage volumes.

use nego_core::ScenarioState;
use serde::{Deserialize, Serialize};

/// Calibration parameters for the heuristic driver formulas.
///
/// These are tuning inputs, not derived invariants; the defaults match the
/// values the dashboard shipped with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverCalibration {
    /// Average characters per word when sizing SMS content.
    pub chars_per_word: f64,
    /// Character budget of a standalone SMS segment.
    pub single_segment_chars: f64,
    /// Per-segment character budget once content is concatenated.
    pub concat_segment_chars: f64,
    /// WhatsApp conversations as a share of total conversations.
    pub whatsapp_share: f64,
    /// Flex seats per conversation.
    pub flex_seats_per_conversation: f64,
    /// Minimum Flex seat count.
    pub flex_seat_floor: f64,
    /// Emails per lead (converted to thousands).
    pub emails_per_lead: f64,
    /// Minimum email volume in thousands.
    pub email_thousands_floor: f64,
    /// Segment monthly-tracked-units per lead.
    pub segment_mtus_per_lead: f64,
    /// Segment monthly-tracked-units per Flex seat.
    pub segment_mtus_per_seat: f64,
}

impl Default for DriverCalibration {
    fn default() -> Self {
        Self {
            chars_per_word: 5.2,
            single_segment_chars: 160.0,
            concat_segment_chars: 153.0,
            whatsapp_share: 0.22,
            flex_seats_per_conversation: 0.0015,
            flex_seat_floor: 60.0,
            emails_per_lead: 0.45,
            email_thousands_floor: 1.0,
            segment_mtus_per_lead: 0.55,
            segment_mtus_per_seat: 40.0,
        }
    }
}

/// Derived per-channel usage volumes. Recomputed fresh from a
/// [`ScenarioState`] on every input change; never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Drivers {
    pub leads: f64,
    pub conversations: f64,
    pub outbound: f64,
    pub inbound: f64,
    /// Billable segments per outbound SMS.
    pub segments_per_message: f64,
    pub sms_standard: f64,
    pub sms_toll_free: f64,
    pub mms_messages: f64,
    pub rcs_messages: f64,
    pub verify_checks: f64,
    pub ai_responses: f64,
    pub lookups: f64,
    pub voice_minutes: f64,
    pub whatsapp: f64,
    pub flex_seats: f64,
    pub email_thousands: f64,
    pub segment_mtus: f64,
}

fn pos(value: f64) -> f64 {
    value.max(0.0)
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Billable segments for a message of the given word count.
///
/// Content at or under the standalone budget is one segment; concatenated
/// content divides by the smaller per-segment budget and rounds up.
pub fn segments_from_words(words: f64, cal: &DriverCalibration) -> f64 {
    let characters = pos(words) * cal.chars_per_word;
    if characters <= cal.single_segment_chars {
        1.0
    } else {
        (characters / cal.concat_segment_chars).ceil()
    }
}

/// Derive usage volumes with the default calibration.
pub fn derive_drivers(state: &ScenarioState) -> Drivers {
    derive_drivers_with(state, &DriverCalibration::default())
}

/// Derive usage volumes from a scenario.
///
/// Pure and total: every ratio is clamped into [0,1] and every count into
/// [0, inf) before it participates, so no output field is ever negative.
pub fn derive_drivers_with(state: &ScenarioState, cal: &DriverCalibration) -> Drivers {
    let leads = state.leads as f64;
    let conversations = leads * pos(state.conversations_per_lead);
    let outbound = conversations * pos(state.outbound_per_conversation);
    let inbound = conversations * pos(state.inbound_per_conversation);
    let segments = segments_from_words(state.words_per_outbound, cal);

    // Sequential channel split: RCS comes off the top, MMS off the
    // remainder, and what is left is SMS, divided into toll-free vs
    // standard segments. Remainders never go negative.
    let rcs_messages = outbound * clamp01(state.rcs_adoption);
    let non_rcs = pos(outbound - rcs_messages);
    let mms_messages = non_rcs * clamp01(state.mms_share);
    let sms_outbound = pos(non_rcs - mms_messages);
    let sms_segments = sms_outbound * segments;
    let sms_toll_free = sms_segments * clamp01(state.toll_free_share);
    let sms_standard = pos(sms_segments - sms_toll_free);

    let verify_checks =
        leads * pos(state.verify_attempts_per_lead) * clamp01(state.verify_success_rate);
    let ai_responses = conversations * pos(state.ai_replies_per_conversation);
    let lookups = leads * pos(state.lookups_per_lead);
    let voice_minutes = leads * pos(state.calls_per_lead) * pos(state.minutes_per_call);
    let whatsapp = conversations * cal.whatsapp_share;
    let flex_seats = (conversations * cal.flex_seats_per_conversation).max(cal.flex_seat_floor);
    let email_thousands = (leads * cal.emails_per_lead / 1000.0).max(cal.email_thousands_floor);
    let segment_mtus = (leads * cal.segment_mtus_per_lead).max(flex_seats * cal.segment_mtus_per_seat);

    Drivers {
        leads,
        conversations,
        outbound,
        inbound,
        segments_per_message: segments,
        sms_standard,
        sms_toll_free,
        mms_messages,
        rcs_messages,
        verify_checks,
        ai_responses,
        lookups,
        voice_minutes,
        whatsapp,
        flex_seats,
        email_thousands,
        segment_mtus,
    }
}

impl Drivers {
    /// All volume fields in declaration order, for aggregate checks.
    pub fn fields(&self) -> [f64; 17] {
        [
            self.leads,
            self.conversations,
            self.outbound,
            self.inbound,
            self.segments_per_message,
            self.sms_standard,
            self.sms_toll_free,
            self.mms_messages,
            self.rcs_messages,
            self.verify_checks,
            self.ai_responses,
            self.lookups,
            self.voice_minutes,
            self.whatsapp,
            self.flex_seats,
            self.email_thousands,
            self.segment_mtus,
        ]
    }
}
