use rand::Rng;
use std::time::Duration;

/// Destination for submitted comments
pub trait CommentSink {
    async fn post_comment(
        &self,
        video_id: &str,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error>>;
}

impl CommentSink for yt_api::YouTubeClient {
    async fn post_comment(
        &self,
        video_id: &str,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.insert_comment(video_id, text).await
    }
}

/// Post `count` comments, each pairing a uniformly random video with a
/// uniformly random template (both with replacement), sleeping `delay`
/// after every submission including the last.
///
/// A failed submission is reported on the console and the loop continues;
/// it never aborts the run. With no videos or no templates the dispatcher
/// refuses to post at all.
pub async fn run<S: CommentSink, R: Rng>(
    sink: &S,
    videos: &[String],
    comments: &[String],
    count: u32,
    delay: Duration,
    rng: &mut R,
) {
    if comments.is_empty() {
        println!("No comments to post. Exiting script.");
        return;
    }
    if videos.is_empty() {
        println!("No videos found to comment on. Exiting script.");
        return;
    }

    for _ in 0..count {
        let video_id = &videos[rng.gen_range(0..videos.len())];
        let comment = comments[rng.gen_range(0..comments.len())].trim();

        match sink.post_comment(video_id, comment).await {
            Ok(()) => println!("Comment posted: {} on video {}", comment, video_id),
            Err(e) => eprintln!("Error posting comment: {}", e),
        }

        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        posts: Mutex<Vec<(String, String)>>,
        /// 1-based attempt number that fails, if any
        fail_on: Option<usize>,
    }

    impl RecordingSink {
        fn failing_on(attempt: usize) -> Self {
            Self {
                posts: Mutex::new(Vec::new()),
                fail_on: Some(attempt),
            }
        }

        fn posts(&self) -> Vec<(String, String)> {
            self.posts.lock().unwrap().clone()
        }
    }

    impl CommentSink for RecordingSink {
        async fn post_comment(
            &self,
            video_id: &str,
            text: &str,
        ) -> Result<(), Box<dyn std::error::Error>> {
            let mut posts = self.posts.lock().unwrap();
            posts.push((video_id.to_string(), text.to_string()));
            if self.fail_on == Some(posts.len()) {
                return Err("simulated submission failure".into());
            }
            Ok(())
        }
    }

    fn videos() -> Vec<String> {
        vec!["vidA".to_string(), "vidB".to_string(), "vidC".to_string()]
    }

    fn comments() -> Vec<String> {
        vec!["Great video!".to_string(), "Nice content".to_string()]
    }

    #[tokio::test]
    async fn empty_comments_make_zero_posts() {
        let sink = RecordingSink::default();
        let mut rng = StdRng::seed_from_u64(1);

        run(&sink, &videos(), &[], 5, Duration::ZERO, &mut rng).await;

        assert!(sink.posts().is_empty());
    }

    #[tokio::test]
    async fn empty_videos_make_zero_posts() {
        let sink = RecordingSink::default();
        let mut rng = StdRng::seed_from_u64(1);

        run(&sink, &[], &comments(), 5, Duration::ZERO, &mut rng).await;

        assert!(sink.posts().is_empty());
    }

    #[tokio::test]
    async fn a_failed_post_does_not_stop_the_loop() {
        let sink = RecordingSink::failing_on(3);
        let mut rng = StdRng::seed_from_u64(7);

        run(&sink, &videos(), &comments(), 5, Duration::ZERO, &mut rng).await;

        // Iterations 4 and 5 still ran; attempts equal count
        assert_eq!(sink.posts().len(), 5);
    }

    #[tokio::test]
    async fn seeded_runs_are_reproducible() {
        let videos = videos();
        let comments = comments();

        let first = RecordingSink::default();
        let mut rng = StdRng::seed_from_u64(42);
        run(&first, &videos, &comments, 4, Duration::ZERO, &mut rng).await;

        let second = RecordingSink::default();
        let mut rng = StdRng::seed_from_u64(42);
        run(&second, &videos, &comments, 4, Duration::ZERO, &mut rng).await;

        let sequence = first.posts();
        assert_eq!(sequence.len(), 4);
        assert_eq!(sequence, second.posts());

        for (video, comment) in &sequence {
            assert!(videos.contains(video));
            assert!(comments.iter().any(|c| c.trim() == comment));
        }
    }

    #[tokio::test]
    async fn comments_are_trimmed_at_post_time() {
        let sink = RecordingSink::default();
        let mut rng = StdRng::seed_from_u64(3);
        let padded = vec!["   Great video!   ".to_string()];

        run(&sink, &videos(), &padded, 1, Duration::ZERO, &mut rng).await;

        assert_eq!(sink.posts()[0].1, "Great video!");
    }
}
