//! Who hears about what. Each builder returns one entry per recipient.

use chrono::{DateTime, Utc};

use crate::models::{AppointmentEvent, CancelledBy, NewNotification, NotificationKind, PaymentEvent};

fn when(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M UTC").to_string()
}

pub fn appointment_booked(event: &AppointmentEvent) -> Vec<NewNotification> {
    vec![
        NewNotification::new(
            event.professional_id,
            NotificationKind::AppointmentBooked,
            "New appointment request",
            format!("A client booked an appointment for {}", when(event.start_time)),
        )
        .for_appointment(event.appointment_id),
        NewNotification::new(
            event.client_id,
            NotificationKind::AppointmentBooked,
            "Appointment requested",
            format!("Your appointment for {} is waiting for confirmation", when(event.start_time)),
        )
        .for_appointment(event.appointment_id),
    ]
}

pub fn appointment_confirmed(event: &AppointmentEvent) -> Vec<NewNotification> {
    vec![NewNotification::new(
        event.client_id,
        NotificationKind::AppointmentConfirmed,
        "Appointment confirmed",
        format!("Your appointment for {} was confirmed", when(event.start_time)),
    )
    .for_appointment(event.appointment_id)]
}

pub fn appointment_cancelled(event: &AppointmentEvent, by: CancelledBy) -> Vec<NewNotification> {
    let to_client = NewNotification::new(
        event.client_id,
        NotificationKind::AppointmentCancelled,
        "Appointment cancelled",
        match by {
            CancelledBy::Client => format!("You cancelled your appointment for {}", when(event.start_time)),
            CancelledBy::Professional => format!(
                "The professional cancelled your appointment for {}",
                when(event.start_time)
            ),
        },
    )
    .for_appointment(event.appointment_id);

    match by {
        CancelledBy::Client => vec![
            NewNotification::new(
                event.professional_id,
                NotificationKind::AppointmentCancelled,
                "Appointment cancelled",
                format!("The appointment for {} was cancelled by the client", when(event.start_time)),
            )
            .for_appointment(event.appointment_id),
            to_client,
        ],
        CancelledBy::Professional => vec![to_client],
    }
}

pub fn appointment_rescheduled(event: &AppointmentEvent) -> Vec<NewNotification> {
    let moved = match event.previous_start_time {
        Some(previous) => format!("moved from {} to {}", when(previous), when(event.start_time)),
        None => format!("moved to {}", when(event.start_time)),
    };

    [event.professional_id, event.client_id]
        .into_iter()
        .map(|user_id| {
            NewNotification::new(
                user_id,
                NotificationKind::AppointmentRescheduled,
                "Appointment rescheduled",
                format!("An appointment was {}", moved),
            )
            .for_appointment(event.appointment_id)
        })
        .collect()
}

pub fn payment_succeeded(event: &PaymentEvent) -> Vec<NewNotification> {
    let mut notifications = vec![NewNotification::new(
        event.client_id,
        NotificationKind::PaymentSucceeded,
        "Payment received",
        format!("Payment of ${} COP completed (ref {})", event.amount, event.reference),
    )
    .for_appointment(event.appointment_id)];

    if let Some(professional_id) = event.professional_id {
        notifications.push(
            NewNotification::new(
                professional_id,
                NotificationKind::PaymentSucceeded,
                "Appointment paid",
                format!("The client paid ${} COP for an appointment", event.amount),
            )
            .for_appointment(event.appointment_id),
        );
    }
    notifications
}

pub fn payment_failed(event: &PaymentEvent, reason: &str) -> Vec<NewNotification> {
    vec![NewNotification::new(
        event.client_id,
        NotificationKind::PaymentFailed,
        "Payment failed",
        format!("Payment {} could not be completed: {}", event.reference, reason),
    )
    .for_appointment(event.appointment_id)]
}
