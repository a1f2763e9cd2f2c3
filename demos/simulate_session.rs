//! Simulate a scripted focus session from synthetic landmarks and print the record
//!
//! Script (10 fps): calibrate and work with eyes open, rub the nose for a few
//! seconds, look away until the session pauses, continue from the pause
//! overlay, then quit.

use synheart_focus::features::{
    Finger, FOREHEAD_CENTER, LEFT_EYE, LEFT_EYE_CENTER, LEFT_TEMPLE, LOWER_LIP, MOUTH_CORNERS,
    NOSE_BRIDGE, NOSE_TIP, RIGHT_EYE, RIGHT_EYE_CENTER, RIGHT_TEMPLE, UPPER_LIP,
};
use synheart_focus::types::TimedFrame;
use synheart_focus::{
    FocusError, FocusProcessor, FrameReport, LandmarkFrame, LandmarkSource, Point, SessionRunner,
    UiEvents, UserCommand,
};

const FPS: f64 = 10.0;

struct ScriptedCamera {
    frame: u32,
    events: UiEvents,
}

impl LandmarkSource for ScriptedCamera {
    fn next_frame(&mut self) -> Result<Option<TimedFrame>, FocusError> {
        let t = self.frame as f64 / FPS;
        if self.frame == 580 {
            self.events.post(UserCommand::Continue);
        }
        if self.frame == 750 {
            self.events.request_quit();
        }
        self.frame += 1;

        let looking_away = (20.0..58.0).contains(&t);
        let ear = if looking_away { 0.1 } else { 0.3 };
        let mut frame = LandmarkFrame::with_face(face(ear));
        if (10.0..14.0).contains(&t) {
            let mut hand = vec![Point::new(0.9, 0.9); 21];
            hand[Finger::Index.tip_index()] = Point::new(0.5, 0.5);
            frame = frame.with_hands(vec![hand]);
        }
        Ok(Some(TimedFrame::new(t, frame)))
    }
}

fn face(ear: f64) -> Vec<Point> {
    let mut face = vec![Point::new(0.5, 0.8); 478];
    for (indices, x) in [(&LEFT_EYE, 0.375), (&RIGHT_EYE, 0.5625)] {
        let half = ear * 0.0625 / 2.0;
        face[indices[0]] = Point::new(x, 0.375);
        face[indices[1]] = Point::new(x + 0.015625, 0.375 - half);
        face[indices[2]] = Point::new(x + 0.046875, 0.375 - half);
        face[indices[3]] = Point::new(x + 0.0625, 0.375);
        face[indices[4]] = Point::new(x + 0.046875, 0.375 + half);
        face[indices[5]] = Point::new(x + 0.015625, 0.375 + half);
    }
    face[LEFT_EYE_CENTER] = Point::new(0.40625, 0.375);
    face[RIGHT_EYE_CENTER] = Point::new(0.59375, 0.375);
    face[NOSE_TIP] = Point::new(0.5, 0.5);
    for (i, idx) in NOSE_BRIDGE.iter().enumerate() {
        face[*idx] = Point::new(0.5, 0.40625 + i as f64 * 0.015625);
    }
    face[UPPER_LIP] = Point::new(0.5, 0.5625);
    face[LOWER_LIP] = Point::new(0.5, 0.578125);
    face[MOUTH_CORNERS[0]] = Point::new(0.4375, 0.5703125);
    face[MOUTH_CORNERS[1]] = Point::new(0.5625, 0.5703125);
    face[FOREHEAD_CENTER] = Point::new(0.5, 0.1875);
    face[LEFT_TEMPLE] = Point::new(0.3125, 0.34375);
    face[RIGHT_TEMPLE] = Point::new(0.6875, 0.34375);
    face
}

fn main() {
    let events = UiEvents::new();
    let mut camera = ScriptedCamera {
        frame: 0,
        events: events.clone(),
    };
    let mut runner = SessionRunner::new(FocusProcessor::default(), events);

    let mut last_state = None;
    let result = runner.run(&mut camera, &mut |report: &FrameReport| {
        if last_state != Some(report.state) {
            println!("{:>6.1}s  {}", report.timestamp, report.state.label());
            last_state = Some(report.state);
        }
        for transition in &report.transitions {
            let edge = if transition.active { "on" } else { "off" };
            println!(
                "{:>6.1}s  {} {}",
                report.timestamp,
                transition.category.label(),
                edge
            );
        }
    });

    match result.and_then(|outcome| outcome.record.to_json()) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}
