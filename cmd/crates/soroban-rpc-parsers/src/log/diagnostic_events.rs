use stellar_xdr::curr::DiagnosticEvent;

pub fn diagnostic_events(events: &[DiagnosticEvent], level: tracing::Level) {
    for (i, event) in events.iter().enumerate() {
        if level == tracing::Level::TRACE {
            tracing::trace!("{i}: {event:#?}");
        } else if level == tracing::Level::DEBUG {
            tracing::debug!("{i}: {event:#?}");
        } else if level == tracing::Level::INFO {
            tracing::info!("{i}: {event:#?}");
        } else if level == tracing::Level::WARN {
            tracing::warn!("{i}: {event:#?}");
        } else {
            tracing::error!("{i}: {event:#?}");
        }
    }
}
