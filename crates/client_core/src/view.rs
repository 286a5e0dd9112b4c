//! Display fragments for the activity list, the selector and the signup form.
//!
//! Everything here is plain data. Front ends either walk the fragments
//! directly (GUI, terminal) or render them to HTML with [`ActivityCard::to_html`]
//! and [`ActivityListView::to_html`]. Server-provided strings are escaped on
//! the HTML path.

use askama::Template;
use shared::domain::{ActivityCatalog, ActivityDetails};

pub const EMPTY_ROSTER_NOTICE: &str = "No participants yet. Be the first to sign up!";
pub const LOADING_NOTICE: &str = "Loading activities...";
pub const LOAD_FAILED_NOTICE: &str = "Failed to load activities. Please try again later.";
pub const SELECTOR_PLACEHOLDER: &str = "-- Select an activity --";

/// Removal action for one participant of one activity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoveControl {
    pub participant: String,
    pub activity: String,
}

impl RemoveControl {
    pub fn confirmation_prompt(&self) -> String {
        confirmation_prompt(&self.participant, &self.activity)
    }
}

pub fn confirmation_prompt(participant: &str, activity: &str) -> String {
    format!("Are you sure you want to remove {participant} from {activity}?")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    pub participant: String,
    pub remove: RemoveControl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Roster {
    Empty,
    Participants(Vec<ParticipantRow>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCard {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub spots_left: Option<u32>,
    pub roster: Roster,
}

impl ActivityCard {
    pub fn rows(&self) -> &[ParticipantRow] {
        match &self.roster {
            Roster::Empty => &[],
            Roster::Participants(rows) => rows,
        }
    }

    pub fn remove_controls(&self) -> impl Iterator<Item = &RemoveControl> {
        self.rows().iter().map(|row| &row.remove)
    }

    pub fn to_html(&self) -> Result<String, askama::Error> {
        ActivityCardTemplate {
            card: self,
            rows: self.rows(),
            empty_notice: EMPTY_ROSTER_NOTICE,
        }
        .render()
    }
}

/// Maps one activity to its card. Every participant gets a removal control
/// tagged with the participant and `name`.
pub fn render_activity(name: &str, details: &ActivityDetails) -> ActivityCard {
    let roster = if details.participants.is_empty() {
        Roster::Empty
    } else {
        Roster::Participants(
            details
                .participants
                .iter()
                .map(|participant| ParticipantRow {
                    participant: participant.clone(),
                    remove: RemoveControl {
                        participant: participant.clone(),
                        activity: name.to_string(),
                    },
                })
                .collect(),
        )
    };

    ActivityCard {
        name: name.to_string(),
        description: details.description.clone(),
        schedule: details.schedule.clone(),
        spots_left: details.spots_left(),
        roster,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListArea {
    Loading,
    Cards(Vec<ActivityCard>),
    Unavailable(String),
}

/// The list area plus the activity selector, as of the last refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityListView {
    pub area: ListArea,
    pub options: Vec<SelectorOption>,
}

impl Default for ActivityListView {
    fn default() -> Self {
        Self {
            area: ListArea::Loading,
            options: Vec::new(),
        }
    }
}

impl ActivityListView {
    pub fn from_catalog(catalog: &ActivityCatalog) -> Self {
        let mut cards = Vec::with_capacity(catalog.len());
        let mut options = Vec::with_capacity(catalog.len());
        for (name, details) in catalog {
            cards.push(render_activity(name, details));
            options.push(SelectorOption {
                value: name.clone(),
                label: name.clone(),
            });
        }
        Self {
            area: ListArea::Cards(cards),
            options,
        }
    }

    /// Swaps the list area for the failure notice. Selector options from the
    /// last successful fetch stay.
    pub fn mark_unavailable(&mut self) {
        self.area = ListArea::Unavailable(LOAD_FAILED_NOTICE.to_string());
    }

    pub fn cards(&self) -> &[ActivityCard] {
        match &self.area {
            ListArea::Cards(cards) => cards,
            ListArea::Loading | ListArea::Unavailable(_) => &[],
        }
    }

    pub fn has_option(&self, activity: &str) -> bool {
        self.options.iter().any(|option| option.value == activity)
    }

    pub fn to_html(&self) -> Result<String, askama::Error> {
        let mut cards_html = String::new();
        for card in self.cards() {
            cards_html.push_str(&card.to_html()?);
        }
        let notice = match &self.area {
            ListArea::Loading => Some(LOADING_NOTICE),
            ListArea::Unavailable(notice) => Some(notice.as_str()),
            ListArea::Cards(_) => None,
        };
        ActivityListTemplate {
            cards_html: &cards_html,
            notice,
            placeholder: SELECTOR_PLACEHOLDER,
            options: &self.options,
        }
        .render()
    }
}

/// Signup form contents. Owned by the front end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub activity: Option<String>,
    pub participant: String,
}

impl SelectionState {
    pub fn is_complete(&self) -> bool {
        !self.participant.trim().is_empty()
            && self.activity.as_deref().is_some_and(|a| !a.is_empty())
    }

    pub fn reset(&mut self) {
        self.activity = None;
        self.participant.clear();
    }

    /// Drops a selected activity that the latest refresh no longer offers.
    pub fn retain_valid(&mut self, view: &ActivityListView) {
        if let Some(activity) = &self.activity {
            if !view.has_option(activity) {
                self.activity = None;
            }
        }
    }
}

#[derive(Template)]
#[template(
    source = r#"<div class="activity-card">
  <h4>{{ card.name }}</h4>
  <p><strong>Description:</strong> {{ card.description }}</p>
  <p><strong>Schedule:</strong> {{ card.schedule }}</p>
  {%- match card.spots_left %}
  {%- when Some with (spots) %}
  <p><strong>Availability:</strong> {{ spots }} spots left</p>
  {%- when None %}
  {%- endmatch %}
  <div class="participants">
    <h5>Participants</h5>
    {%- if rows.is_empty() %}
    <p class="no-participants">{{ empty_notice }}</p>
    {%- else %}
    <div class="participants-list">
    {%- for row in rows %}
      <div class="participant-item"><span>{{ row.participant }}</span><button class="delete-btn" data-email="{{ row.remove.participant }}" data-activity="{{ row.remove.activity }}" title="Remove participant">&#x2715;</button></div>
    {%- endfor %}
    </div>
    {%- endif %}
  </div>
</div>
"#,
    ext = "html"
)]
struct ActivityCardTemplate<'a> {
    card: &'a ActivityCard,
    rows: &'a [ParticipantRow],
    empty_notice: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<div id="activities-list">
{%- match notice %}
{%- when Some with (text) %}
<p>{{ text }}</p>
{%- when None %}
{{ cards_html|safe }}
{%- endmatch %}
</div>
<select id="activity" required>
  <option value="">{{ placeholder }}</option>
{%- for option in options %}
  <option value="{{ option.value }}">{{ option.label }}</option>
{%- endfor %}
</select>
"#,
    ext = "html"
)]
struct ActivityListTemplate<'a> {
    cards_html: &'a str,
    notice: Option<&'a str>,
    placeholder: &'a str,
    options: &'a [SelectorOption],
}
