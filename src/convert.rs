//! Record → script value conversion, run by the Drain Step.

use crate::engine::{ConversionError, ScriptEngine};
use crate::record::{Event, Field, Payload};

/// Build `(event_name, payload)` for one record.
pub fn event_args<E, T>(
    engine: &mut E,
    record: &T,
) -> Result<(E::Value, Option<E::Value>), ConversionError>
where
    E: ScriptEngine,
    T: Event + ?Sized,
{
    let name = engine.string(record.name())?;
    let payload = match record.payload() {
        Some(payload) => Some(match payload.as_scalar() {
            Some(field) => field_value(engine, &field)?,
            None => payload_object(engine, &payload)?,
        }),
        None => None,
    };
    Ok((name, payload))
}

/// Build a script object from a payload description.
pub fn payload_object<E: ScriptEngine>(
    engine: &mut E,
    payload: &Payload<'_>,
) -> Result<E::Value, ConversionError> {
    let mut object = engine.object()?;
    for (key, field) in payload.fields() {
        let value = field_value(engine, field)?;
        engine.set_property(&mut object, key, value)?;
    }
    Ok(object)
}

fn field_value<E: ScriptEngine>(
    engine: &mut E,
    field: &Field<'_>,
) -> Result<E::Value, ConversionError> {
    match *field {
        Field::Bool(b) => Ok(engine.boolean(b)),
        Field::Int(v) => Ok(engine.int(v)),
        Field::Uint(v) => Ok(engine.uint(v)),
        Field::Text(s) => engine.string(s),
        Field::Bytes(b) => engine.bytes(b),
    }
}
