//! System instructions of the assistant.

use autofuturo_types::DialInfo;
use chrono::{DateTime, Datelike, FixedOffset, Utc};
use std::fmt::Write;

/// Instructions bundled with the binary.
pub const BUNDLED_INSTRUCTIONS: &str = include_str!("../prompts/instructions.md");

/// Spoken right after an inbound session starts.
pub const GREETING_INSTRUCTION: &str = "Saluda al usuario y ofrécele tu ayuda.";

/// Spoken by `end_call` before the room is deleted.
pub const FAREWELL_INSTRUCTION: &str =
    "Gracias por tu tiempo. Ha sido un placer ayudarte. La llamada está terminando.";

const TODAY_PLACEHOLDER: &str = "{today}";

/// The dealership's local time zone.
const LOCAL_OFFSET: FixedOffset = match FixedOffset::west_opt(5 * 3600) {
    Some(offset) => offset,
    None => panic!("invalid UTC offset"),
};

const WEEKDAYS: [&str; 7] = [
    "lunes",
    "martes",
    "miércoles",
    "jueves",
    "viernes",
    "sábado",
    "domingo",
];

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Current time at the dealership.
pub fn local_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&LOCAL_OFFSET)
}

/// Formats a timestamp in Spanish, e.g.
/// `sábado, 17 de octubre de 2026, 09:15 AM (UTC-5)`.
pub fn spanish_date(at: DateTime<FixedOffset>) -> String {
    let weekday = WEEKDAYS[at.weekday().num_days_from_monday() as usize];
    let month = MONTHS[at.month0() as usize];
    format!(
        "{weekday}, {:02} de {month} de {}, {} (UTC-5)",
        at.day(),
        at.year(),
        at.format("%I:%M %p")
    )
}

/// Loads the instruction template from `path`, or the bundled one.
///
/// # Errors
///
/// Returns the I/O error when `path` is set but cannot be read.
pub fn load_template(path: Option<&str>) -> std::io::Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p),
        None => Ok(BUNDLED_INSTRUCTIONS.to_string()),
    }
}

/// Replaces every `{today}` in `template` with the formatted date.
pub fn render_instructions(template: &str, at: DateTime<FixedOffset>) -> String {
    template.replace(TODAY_PLACEHOLDER, &spanish_date(at))
}

/// Section appended to the instructions of an outbound call.
pub fn outbound_context(dial: &DialInfo) -> String {
    let mut section = String::from("\n\n## Contexto de la llamada\n");
    section.push_str(
        "Esta es una llamada saliente: tú llamaste al cliente. Espera a que conteste y hable primero.\n",
    );
    let _ = writeln!(section, "- Teléfono: {}", dial.phone_number);
    if let Some(name) = &dial.name {
        let _ = writeln!(section, "- Nombre del cliente: {name}");
    }
    if let Some(appointment) = &dial.appointment_time {
        let _ = writeln!(
            section,
            "- Cita agendada: {appointment}. Confirma con el cliente que podrá asistir."
        );
    }
    section
}
