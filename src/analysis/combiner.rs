use chrono::Utc;
use std::collections::HashSet;

use super::CombinedNews;
use crate::data::{
    sentiment::NEUTRAL_SENTIMENT, validation::clamp_sentiment, Category, NewsArticle, SocialFeed,
    SocialPost,
};

/// Characters of post content kept as the article title
const SOCIAL_TITLE_CHARS: usize = 100;

/// Merge news with social posts: dedupe by url (title when url is empty) keeping the
/// first occurrence, newest first, capped at `max_articles`.
pub fn combine(news: Vec<NewsArticle>, social: Option<&SocialFeed>, max_articles: usize) -> CombinedNews {
    let social_articles = social
        .map(|feed| feed.posts.iter().map(social_to_article).collect::<Vec<_>>())
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let mut articles: Vec<NewsArticle> = news
        .into_iter()
        .chain(social_articles)
        .filter(|article| {
            let key = if article.url.is_empty() {
                format!("title:{}", article.title)
            } else {
                format!("url:{}", article.url)
            };
            seen.insert(key)
        })
        .map(|mut article| {
            article.sentiment = clamp_sentiment(article.sentiment);
            article
        })
        .collect();

    articles.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    articles.truncate(max_articles);

    let source_count = source_count(&articles);
    let sentiment_score = mean_sentiment(&articles);

    tracing::debug!(
        articles = articles.len(),
        source_count,
        sentiment_score,
        "Combined news and social records"
    );

    CombinedNews {
        articles,
        last_updated: Utc::now(),
        source_count,
        sentiment_score,
    }
}

/// Convert a social post into an article-shaped record
pub fn social_to_article(post: &SocialPost) -> NewsArticle {
    let title = if post.content.chars().count() > SOCIAL_TITLE_CHARS {
        let head: String = post.content.chars().take(SOCIAL_TITLE_CHARS).collect();
        format!("{}...", head.trim_end())
    } else {
        post.content.clone()
    };

    let platform = post.platform.to_lowercase();
    let url = post.url.clone().unwrap_or_else(|| {
        let handle: String = post
            .author
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        format!(
            "https://{}.com/{}/status/{}",
            platform,
            handle,
            post.timestamp.timestamp_millis()
        )
    });

    NewsArticle {
        title,
        source: format!("social-{}", platform),
        url,
        sentiment: post.sentiment,
        summary: post.content.clone(),
        timestamp: post.timestamp,
        content: post.content.clone(),
        author: Some(post.author.clone()),
        category: Category::General,
        platform: Some(post.platform.clone()),
    }
}

/// Distinct source ids
pub fn source_count(articles: &[NewsArticle]) -> usize {
    articles
        .iter()
        .map(|a| a.source.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Arithmetic mean of article sentiment; neutral for an empty set
pub fn mean_sentiment(articles: &[NewsArticle]) -> f64 {
    if articles.is_empty() {
        return NEUTRAL_SENTIMENT;
    }
    articles.iter().map(|a| a.sentiment).sum::<f64>() / articles.len() as f64
}
