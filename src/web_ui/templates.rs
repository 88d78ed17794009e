//! Template engine setup and HTML templates.

use once_cell::sync::Lazy;
use tera::{Context, Tera};

/// Global template engine instance with embedded templates.
pub static TEMPLATES: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();

    // Embed templates directly in the binary (no external files needed)
    tera.add_raw_templates(vec![
        ("base.html", BASE_TEMPLATE),
        ("home.html", HOME_TEMPLATE),
        ("explore.html", EXPLORE_TEMPLATE),
        ("ask.html", ASK_TEMPLATE),
        ("question.html", QUESTION_TEMPLATE),
        ("search.html", SEARCH_TEMPLATE),
        ("signin.html", SIGNIN_TEMPLATE),
        ("signup.html", SIGNUP_TEMPLATE),
        ("user.html", USER_TEMPLATE),
        ("topic.html", TOPIC_TEMPLATE),
        ("404.html", NOT_FOUND_TEMPLATE),
        ("error.html", ERROR_TEMPLATE),
        ("admin/base.html", ADMIN_BASE_TEMPLATE),
        ("admin/questions.html", ADMIN_QUESTIONS_TEMPLATE),
        ("admin/question_edit.html", ADMIN_QUESTION_EDIT_TEMPLATE),
        ("admin/answers.html", ADMIN_ANSWERS_TEMPLATE),
        ("admin/answer_edit.html", ADMIN_ANSWER_EDIT_TEMPLATE),
        ("admin/users.html", ADMIN_USERS_TEMPLATE),
        ("admin/user_edit.html", ADMIN_USER_EDIT_TEMPLATE),
        ("admin/roles.html", ADMIN_ROLES_TEMPLATE),
        ("admin/role_edit.html", ADMIN_ROLE_EDIT_TEMPLATE),
    ])
    .expect("Failed to load templates");

    tera
});

/// Render a template with context
pub fn render(template: &str, context: &Context) -> Result<String, tera::Error> {
    TEMPLATES.render(template, context)
}

// =============================================================================
// Embedded Templates
// =============================================================================

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{% block title %}QnA{% endblock %}</title>
    <style>
        :root {
            --bg: #0a0a0a;
            --bg-secondary: #141414;
            --foreground: #fafafa;
            --foreground-secondary: rgba(250, 250, 250, 0.7);
            --foreground-tertiary: rgba(250, 250, 250, 0.4);
            --border: #262626;
            --border-subtle: #1a1a1a;
            --accent: #fafafa;
            --danger: #f87171;
        }

        * { box-sizing: border-box; margin: 0; padding: 0; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
            background: var(--bg);
            color: var(--foreground);
            line-height: 1.6;
            -webkit-font-smoothing: antialiased;
        }

        a {
            color: var(--foreground);
            text-decoration: none;
            transition: opacity 0.15s;
        }
        a:hover { opacity: 0.7; }

        /* Header */
        .header {
            border-bottom: 1px solid var(--border-subtle);
            padding: 20px 32px;
        }
        .header-content {
            max-width: 1000px;
            margin: 0 auto;
            display: flex;
            align-items: center;
            justify-content: space-between;
            gap: 24px;
        }
        .logo {
            font-size: 18px;
            font-weight: 600;
            letter-spacing: -0.02em;
        }
        .nav {
            display: flex;
            align-items: center;
            gap: 24px;
        }
        .nav a {
            color: var(--foreground-secondary);
            font-size: 14px;
        }
        .nav a:hover { color: var(--foreground); opacity: 1; }
        .nav-search input { width: 200px; }

        /* Layout */
        .container {
            max-width: 1000px;
            margin: 0 auto;
            padding: 48px 32px;
        }

        /* Typography */
        h1 {
            font-size: 28px;
            font-weight: 600;
            letter-spacing: -0.02em;
            margin-bottom: 24px;
        }
        h2 {
            font-size: 14px;
            font-weight: 500;
            color: var(--foreground-secondary);
            text-transform: uppercase;
            letter-spacing: 0.05em;
            margin-bottom: 16px;
        }

        /* Cards */
        .card {
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 16px;
            overflow: hidden;
        }
        .card + .card { margin-top: 24px; }
        .card-body { padding: 24px; }

        /* Lists */
        .list { list-style: none; }
        .list-item {
            padding: 16px 20px;
            border-bottom: 1px solid var(--border-subtle);
        }
        .list-item:last-child { border-bottom: none; }
        .list-item:hover { background: rgba(255, 255, 255, 0.02); }
        .item-title { font-size: 16px; font-weight: 500; }
        .meta { color: var(--foreground-tertiary); font-size: 13px; }

        /* Badges */
        .badge {
            font-size: 11px;
            font-weight: 500;
            padding: 4px 10px;
            border-radius: 100px;
            background: var(--border);
            color: var(--foreground-secondary);
            letter-spacing: 0.02em;
        }
        .badge-info {
            background: rgba(59, 130, 246, 0.15);
            color: #60a5fa;
        }

        /* Stats */
        .stats {
            display: flex;
            gap: 16px;
            margin-bottom: 32px;
        }
        .stat {
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 16px;
            padding: 16px 24px;
            min-width: 140px;
        }
        .stat-value { font-size: 28px; font-weight: 600; }
        .stat-label { color: var(--foreground-tertiary); font-size: 13px; }

        /* Buttons */
        .btn {
            display: inline-flex;
            align-items: center;
            gap: 8px;
            padding: 10px 20px;
            border-radius: 100px;
            font-size: 14px;
            font-weight: 500;
            transition: all 0.15s;
            border: none;
            cursor: pointer;
        }
        .btn-primary { background: var(--foreground); color: var(--bg); }
        .btn-primary:hover { opacity: 0.9; }
        .btn-secondary {
            background: transparent;
            border: 1px solid var(--border);
            color: var(--foreground);
        }
        .btn-secondary:hover {
            background: var(--bg-secondary);
            border-color: var(--foreground-tertiary);
        }
        .btn-danger { background: transparent; border: 1px solid var(--danger); color: var(--danger); }

        /* Forms */
        .form-input, .form-textarea, .form-select {
            width: 100%;
            padding: 12px 16px;
            background: var(--bg);
            border: 1px solid var(--border);
            border-radius: 8px;
            color: var(--foreground);
            font-size: 14px;
            font-family: inherit;
        }
        .form-textarea { min-height: 180px; resize: vertical; }
        .form-input:focus, .form-textarea:focus { outline: none; border-color: var(--foreground-tertiary); }
        .form-label { display: block; font-size: 13px; color: var(--foreground-secondary); margin: 16px 0 8px; }
        .form-actions { display: flex; gap: 12px; justify-content: flex-end; margin-top: 16px; }
        .alert { padding: 12px 16px; border-radius: 8px; margin-bottom: 16px; font-size: 14px; }
        .alert-error { background: rgba(248, 113, 113, 0.1); color: var(--danger); }
        .alert-info { background: rgba(59, 130, 246, 0.1); color: #60a5fa; }

        /* Rendered Markdown */
        .markdown { color: var(--foreground-secondary); }
        .markdown p + p, .markdown ul, .markdown ol, .markdown table, .markdown .codehilite { margin-top: 12px; }
        .markdown img { max-width: 100%; border-radius: 8px; }
        .markdown a.wikilink { text-decoration: underline; }
        .markdown table { border-collapse: collapse; }
        .markdown th, .markdown td { border: 1px solid var(--border); padding: 6px 12px; }
        .codehilite pre {
            font-family: 'SF Mono', 'Consolas', 'Liberation Mono', Menlo, monospace;
            font-size: 13px;
            background: var(--bg);
            border: 1px solid var(--border);
            padding: 12px 16px;
            border-radius: 8px;
            overflow-x: auto;
        }
        .summary-row { display: flex; gap: 16px; margin-top: 8px; }
        .thumb { width: 120px; height: 80px; object-fit: cover; border-radius: 8px; flex-shrink: 0; }

        /* Comments */
        .comments { margin-top: 16px; border-top: 1px solid var(--border-subtle); padding-top: 12px; }
        .comment { font-size: 13px; color: var(--foreground-secondary); padding: 4px 0; }
        .comment-form { display: flex; gap: 8px; margin-top: 8px; }

        /* Empty state */
        .empty {
            text-align: center;
            padding: 64px 32px;
            color: var(--foreground-tertiary);
        }
        .empty p + p { margin-top: 8px; }

        /* Tables */
        .table { width: 100%; border-collapse: collapse; font-size: 14px; }
        .table th { text-align: left; color: var(--foreground-tertiary); font-weight: 500; padding: 12px 20px; border-bottom: 1px solid var(--border); }
        .table td { padding: 12px 20px; border-bottom: 1px solid var(--border-subtle); }

        /* Utility */
        .text-secondary { color: var(--foreground-secondary); }
        .text-tertiary { color: var(--foreground-tertiary); }
        .text-sm { font-size: 13px; }
        .mt-2 { margin-top: 8px; }
        .mt-4 { margin-top: 16px; }
        .mt-6 { margin-top: 24px; }
        .mb-4 { margin-bottom: 16px; }
        .flex { display: flex; }
        .items-center { align-items: center; }
        .justify-between { justify-content: space-between; }
        .gap-3 { gap: 12px; }
        .inline { display: inline; }

        @media (max-width: 768px) {
            .header { padding: 16px 20px; }
            .container { padding: 32px 20px; }
            .nav { gap: 16px; }
            .nav-search { display: none; }
            h1 { font-size: 22px; }
        }
    </style>
</head>
<body>
    <header class="header">
        <div class="header-content">
            <a href="/" class="logo">QnA</a>
            <form class="nav-search" method="GET" action="/search">
                <input type="text" name="q" class="form-input" placeholder="Search questions" value="{{ key_word | default(value="") }}" />
            </form>
            <nav class="nav">
                <a href="/">Home</a>
                <a href="/explore">Explore</a>
                {% if current_user %}
                {% if current_user.can_write %}<a href="/ask">Ask</a>{% endif %}
                {% if current_user.is_admin %}<a href="/admin">Admin</a>{% endif %}
                <a href="/user/{{ current_user.id }}">{{ current_user.fullname }}</a>
                <a href="/logout">Sign out</a>
                {% else %}
                <a href="/signin">Sign in</a>
                <a href="/signup">Sign up</a>
                {% endif %}
            </nav>
        </div>
    </header>
    <main class="container">
        {% block content %}{% endblock %}
    </main>
</body>
</html>"##;

const HOME_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}QnA{% endblock %}
{% block content %}
<div class="flex items-center justify-between mb-4">
    <h1 style="margin-bottom: 0;">Latest questions</h1>
    {% if current_user and current_user.can_write %}
    <a href="/ask" class="btn btn-primary">Ask a question</a>
    {% endif %}
</div>

<div class="card">
    {% if questions %}
    <ul class="list">
        {% for q in questions %}
        <li class="list-item">
            <a href="/question/{{ q.id }}" class="item-title">{{ q.title }}</a>
            <div class="meta">
                asked by <a href="/user/{{ q.author_id }}">{{ q.author_name }}</a> {{ q.created }}
                &middot; {{ q.answer_count }} answer{% if q.answer_count != 1 %}s{% endif %}
                {% for t in q.topics %}<a href="/topic/{{ t.id }}" class="badge badge-info">{{ t.name }}</a> {% endfor %}
            </div>
            {% if q.latest_answer %}
            <div class="summary-row">
                {% if q.latest_answer.summary_img_url %}
                <img class="thumb" src="{{ q.latest_answer.summary_img_url }}" alt="" />
                {% endif %}
                <div class="markdown text-sm">
                    <span class="meta">{{ q.latest_answer.author_name }}:</span>
                    {{ q.latest_answer.summary | safe }}
                </div>
            </div>
            {% endif %}
        </li>
        {% endfor %}
    </ul>
    {% else %}
    <div class="empty">
        <p>No questions yet</p>
        <p class="text-sm">Be the first to ask one</p>
    </div>
    {% endif %}
</div>
{% endblock %}"##;

const EXPLORE_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Explore - QnA{% endblock %}
{% block content %}
<h1>Explore topics</h1>
<div class="card">
    {% if topics %}
    <ul class="list">
        {% for t in topics %}
        <li class="list-item">
            <a href="/topic/{{ t.id }}" class="item-title">{{ t.name }}</a>
            <span class="badge">{{ t.question_count }}</span>
            {% if t.description %}<p class="text-secondary text-sm">{{ t.description }}</p>{% endif %}
        </li>
        {% endfor %}
    </ul>
    {% else %}
    <div class="empty"><p>No topics yet</p></div>
    {% endif %}
</div>
{% endblock %}"##;

const ASK_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Ask a question - QnA{% endblock %}
{% block content %}
<h1>Ask a question</h1>
{% if error %}<div class="alert alert-error">{{ error }}</div>{% endif %}
<form method="POST" action="/ask" class="card card-body">
    <label class="form-label" for="title">Title</label>
    <input type="text" id="title" name="title" class="form-input" required />
    <label class="form-label" for="content">Details</label>
    <textarea id="content" name="content" class="form-textarea"></textarea>
    <label class="form-label" for="topics">Topics (comma separated)</label>
    <input type="text" id="topics" name="topics" class="form-input" />
    <div class="form-actions">
        <a href="/" class="btn btn-secondary">Cancel</a>
        <button type="submit" class="btn btn-primary">Post question</button>
    </div>
</form>
{% endblock %}"##;

const QUESTION_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}{{ question.title }} - QnA{% endblock %}
{% block content %}
<h1>{{ question.title }}</h1>
<div class="meta mb-4">
    asked by <a href="/user/{{ question.author_id }}">{{ question.author_name }}</a> {{ question.created }}
    {% for t in question.topics %}<a href="/topic/{{ t.id }}" class="badge badge-info">{{ t.name }}</a> {% endfor %}
</div>
{% if error %}<div class="alert alert-error">{{ error }}</div>{% endif %}

<div class="card">
    <div class="card-body">
        {% if question.description %}
        <p class="text-secondary" style="white-space: pre-wrap;">{{ question.description }}</p>
        {% endif %}
        <div class="comments">
            {% for c in question_comments %}
            <div class="comment"><a href="/user/{{ c.author_id }}">{{ c.author_name }}</a>: {{ c.content }} <span class="meta">{{ c.created }}</span></div>
            {% endfor %}
            {% if can_comment %}
            <form method="POST" action="/question/{{ question.id }}/comment" class="comment-form">
                <input type="text" name="content" class="form-input" placeholder="Add a comment" required />
                <button type="submit" class="btn btn-secondary">Comment</button>
            </form>
            {% endif %}
        </div>
    </div>
</div>

<h2 class="mt-6">{{ answers | length }} answer{% if answers | length != 1 %}s{% endif %}</h2>
{% for a in answers %}
<div class="card" id="answer-{{ a.id }}">
    <div class="card-body">
        <div class="meta mb-4"><a href="/user/{{ a.author_id }}">{{ a.author_name }}</a> answered {{ a.created }}</div>
        <div class="markdown">{{ a.content_html | safe }}</div>
        <div class="comments">
            {% for c in a.comments %}
            <div class="comment"><a href="/user/{{ c.author_id }}">{{ c.author_name }}</a>: {{ c.content }} <span class="meta">{{ c.created }}</span></div>
            {% endfor %}
            {% if can_comment %}
            <form method="POST" action="/answer/{{ a.id }}/comment" class="comment-form">
                <input type="text" name="content" class="form-input" placeholder="Add a comment" required />
                <button type="submit" class="btn btn-secondary">Comment</button>
            </form>
            {% endif %}
        </div>
    </div>
</div>
{% endfor %}

{% if can_answer %}
<h2 class="mt-6">Your answer</h2>
<form method="POST" action="/question/{{ question.id }}" class="card card-body">
    <textarea name="answer" class="form-textarea" placeholder="Markdown supported, [[Wiki links]] too" required></textarea>
    <div class="form-actions">
        <button type="submit" class="btn btn-primary">Post answer</button>
    </div>
</form>
{% elif not current_user %}
<p class="text-secondary mt-6"><a href="/signin?next=/question/{{ question.id }}">Sign in</a> to answer.</p>
{% endif %}
{% endblock %}"##;

const SEARCH_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Search - QnA{% endblock %}
{% block content %}
<h1>Search</h1>
<form method="POST" action="/search" class="flex gap-3 mb-4">
    <input type="text" name="q" class="form-input" value="{{ key_word }}" placeholder="Search questions" />
    <button type="submit" class="btn btn-primary">Search</button>
</form>
{% if key_word %}
<div class="card">
    <div class="list-item meta">{{ results | length }} result{% if results | length != 1 %}s{% endif %} for "{{ key_word }}"</div>
    {% if results %}
    <ul class="list">
        {% for q in results %}
        <li class="list-item">
            <a href="/question/{{ q.id }}" class="item-title">{{ q.title }}</a>
            <div class="meta">asked by {{ q.author_name }} {{ q.created }} &middot; {{ q.answer_count }} answers</div>
        </li>
        {% endfor %}
    </ul>
    {% else %}
    <div class="empty"><p>Nothing matched</p></div>
    {% endif %}
</div>
{% endif %}
{% endblock %}"##;

const SIGNIN_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Sign in - QnA{% endblock %}
{% block content %}
<div style="max-width: 420px; margin: 0 auto;">
    <h1>Sign in</h1>
    {% if error %}<div class="alert alert-error">{{ error }}</div>{% endif %}
    {% if message %}<div class="alert alert-info">{{ message }}</div>{% endif %}
    <form method="POST" action="/signin{% if next %}?next={{ next | urlencode_strict }}{% endif %}" class="card card-body">
        <label class="form-label" for="account">Email</label>
        <input type="email" id="account" name="account" class="form-input" required />
        <label class="form-label" for="password">Password</label>
        <input type="password" id="password" name="password" class="form-input" required />
        <div class="form-actions">
            <button type="submit" class="btn btn-primary">Sign in</button>
        </div>
    </form>
    <p class="text-secondary text-sm mt-4">No account? <a href="/signup">Sign up</a></p>
</div>
{% endblock %}"##;

const SIGNUP_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Sign up - QnA{% endblock %}
{% block content %}
<div style="max-width: 420px; margin: 0 auto;">
    <h1>Create an account</h1>
    {% if error %}<div class="alert alert-error">{{ error }}</div>{% endif %}
    <form method="POST" action="/signup" class="card card-body">
        <label class="form-label" for="email">Email</label>
        <input type="email" id="email" name="email" class="form-input" required />
        <label class="form-label" for="fullname">Name</label>
        <input type="text" id="fullname" name="fullname" class="form-input" required />
        <label class="form-label" for="password">Password</label>
        <input type="password" id="password" name="password" class="form-input" required />
        <div class="form-actions">
            <button type="submit" class="btn btn-primary">Sign up</button>
        </div>
    </form>
    <p class="text-secondary text-sm mt-4">Already registered? <a href="/signin">Sign in</a></p>
</div>
{% endblock %}"##;

const USER_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}{{ profile.fullname }} - QnA{% endblock %}
{% block content %}
{% if error %}<div class="alert alert-error">{{ error }}</div>{% endif %}
<div class="flex items-center justify-between mb-4">
    <h1 style="margin-bottom: 0;">{{ profile.fullname }}</h1>
    {% if can_follow %}
    {% if is_following %}
    <form method="POST" action="/user/{{ profile.id }}/unfollow" class="inline">
        <button type="submit" class="btn btn-secondary">Unfollow</button>
    </form>
    {% else %}
    <form method="POST" action="/user/{{ profile.id }}/follow" class="inline">
        <button type="submit" class="btn btn-primary">Follow</button>
    </form>
    {% endif %}
    {% endif %}
</div>
<p class="meta mb-4">
    {% if profile.role_name %}<span class="badge">{{ profile.role_name }}</span>{% endif %}
    joined {{ profile.created }}
    {% if follows_you %}&middot; follows you{% endif %}
</p>

<div class="stats">
    <div class="stat"><div class="stat-value">{{ follower_count }}</div><div class="stat-label">Followers</div></div>
    <div class="stat"><div class="stat-value">{{ followed_count }}</div><div class="stat-label">Following</div></div>
    <div class="stat"><div class="stat-value">{{ questions | length }}</div><div class="stat-label">Questions</div></div>
    <div class="stat"><div class="stat-value">{{ answers | length }}</div><div class="stat-label">Answers</div></div>
</div>

{% if followers or following %}
<p class="text-secondary text-sm mb-4">
    {% if followers %}Followed by {% for p in followers %}<a href="/user/{{ p.id }}">{{ p.fullname }}</a>{% if not loop.last %}, {% endif %}{% endfor %}.{% endif %}
    {% if following %}Follows {% for p in following %}<a href="/user/{{ p.id }}">{{ p.fullname }}</a>{% if not loop.last %}, {% endif %}{% endfor %}.{% endif %}
</p>
{% endif %}

<h2>Questions</h2>
<div class="card">
    {% if questions %}
    <ul class="list">
        {% for q in questions %}
        <li class="list-item"><a href="/question/{{ q.id }}" class="item-title">{{ q.title }}</a> <span class="meta">{{ q.created }}</span></li>
        {% endfor %}
    </ul>
    {% else %}
    <div class="empty"><p>No questions yet</p></div>
    {% endif %}
</div>

<h2 class="mt-6">Answers</h2>
<div class="card">
    {% if answers %}
    <ul class="list">
        {% for a in answers %}
        <li class="list-item">
            <a href="/question/{{ a.question_id }}#answer-{{ a.id }}" class="item-title">{{ a.question_title }}</a>
            <span class="meta">{{ a.created }}</span>
            <div class="summary-row">
                {% if a.summary_img_url %}<img class="thumb" src="{{ a.summary_img_url }}" alt="" />{% endif %}
                <div class="markdown text-sm">{{ a.summary | safe }}</div>
            </div>
        </li>
        {% endfor %}
    </ul>
    {% else %}
    <div class="empty"><p>No answers yet</p></div>
    {% endif %}
</div>
{% endblock %}"##;

const TOPIC_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}{{ topic.name }} - QnA{% endblock %}
{% block content %}
<h1>{{ topic.name }}</h1>
{% if topic.description %}<p class="text-secondary mb-4">{{ topic.description }}</p>{% endif %}
<div class="card">
    {% if questions %}
    <ul class="list">
        {% for q in questions %}
        <li class="list-item">
            <a href="/question/{{ q.id }}" class="item-title">{{ q.title }}</a>
            <div class="meta">asked by {{ q.author_name }} {{ q.created }} &middot; {{ q.answer_count }} answers</div>
        </li>
        {% endfor %}
    </ul>
    {% else %}
    <div class="empty"><p>No questions under this topic</p></div>
    {% endif %}
</div>
{% endblock %}"##;

const NOT_FOUND_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Not found - QnA{% endblock %}
{% block content %}
<div class="card">
    <div style="padding: 48px; text-align: center;">
        <h1 style="margin-bottom: 16px;">Page not found</h1>
        <p class="text-secondary">The page you are looking for does not exist.</p>
        <a href="/" class="btn btn-secondary mt-6">Return home</a>
    </div>
</div>
{% endblock %}"##;

const ERROR_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Error - QnA{% endblock %}
{% block content %}
<div class="card">
    <div style="padding: 48px; text-align: center;">
        <h1 style="margin-bottom: 16px;">Something went wrong</h1>
        <p class="text-secondary">{{ message }}</p>
        <a href="/" class="btn btn-secondary mt-6">Return home</a>
    </div>
</div>
{% endblock %}"##;

// =============================================================================
// Admin panel
// =============================================================================

const ADMIN_BASE_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Admin - QnA{% endblock %}
{% block content %}
<div class="flex gap-3 mb-4">
    <a href="/admin/questions" class="btn {% if section == "questions" %}btn-primary{% else %}btn-secondary{% endif %}">Questions</a>
    <a href="/admin/answers" class="btn {% if section == "answers" %}btn-primary{% else %}btn-secondary{% endif %}">Answers</a>
    <a href="/admin/users" class="btn {% if section == "users" %}btn-primary{% else %}btn-secondary{% endif %}">Users</a>
    <a href="/admin/roles" class="btn {% if section == "roles" %}btn-primary{% else %}btn-secondary{% endif %}">Roles</a>
</div>
{% if error %}<div class="alert alert-error">{{ error }}</div>{% endif %}
{% if message %}<div class="alert alert-info">{{ message }}</div>{% endif %}
{% block admin %}{% endblock %}
{% endblock %}"##;

const ADMIN_QUESTIONS_TEMPLATE: &str = r##"{% extends "admin/base.html" %}
{% block admin %}
<div class="card">
    <table class="table">
        <tr><th>Title</th><th>Author</th><th>Asked</th><th></th></tr>
        {% for q in questions %}
        <tr>
            <td><a href="/question/{{ q.id }}">{{ q.title }}</a></td>
            <td>{{ q.author_name }}</td>
            <td class="meta">{{ q.created }}</td>
            <td>
                <a href="/admin/questions/{{ q.id }}/edit" class="btn btn-secondary">Edit</a>
                <form method="POST" action="/admin/questions/{{ q.id }}/delete" class="inline">
                    <button type="submit" class="btn btn-danger">Delete</button>
                </form>
            </td>
        </tr>
        {% endfor %}
    </table>
</div>
{% endblock %}"##;

const ADMIN_QUESTION_EDIT_TEMPLATE: &str = r##"{% extends "admin/base.html" %}
{% block admin %}
<form method="POST" action="/admin/questions/{{ question.id }}/edit" class="card card-body">
    <label class="form-label" for="title">Title</label>
    <input type="text" id="title" name="title" class="form-input" value="{{ question.title }}" required />
    <label class="form-label" for="description">Description</label>
    <textarea id="description" name="description" class="form-textarea">{{ question.description }}</textarea>
    <div class="form-actions">
        <a href="/admin/questions" class="btn btn-secondary">Cancel</a>
        <button type="submit" class="btn btn-primary">Save</button>
    </div>
</form>
{% endblock %}"##;

const ADMIN_ANSWERS_TEMPLATE: &str = r##"{% extends "admin/base.html" %}
{% block admin %}
<div class="card">
    <table class="table">
        <tr><th>Author</th><th>Question</th><th>Answered</th><th></th></tr>
        {% for a in answers %}
        <tr>
            <td>{{ a.author_name }}</td>
            <td><a href="/question/{{ a.question_id }}#answer-{{ a.id }}">{{ a.question_title }}</a></td>
            <td class="meta">{{ a.created }}</td>
            <td><a href="/admin/answers/{{ a.id }}/edit" class="btn btn-secondary">Edit</a></td>
        </tr>
        {% endfor %}
    </table>
</div>
{% endblock %}"##;

const ADMIN_ANSWER_EDIT_TEMPLATE: &str = r##"{% extends "admin/base.html" %}
{% block admin %}
<form method="POST" action="/admin/answers/{{ answer.id }}/edit" class="card card-body">
    <label class="form-label" for="content">Answer (Markdown)</label>
    <textarea id="content" name="content" class="form-textarea" required>{{ answer.content }}</textarea>
    <div class="form-actions">
        <a href="/question/{{ answer.question_id }}#answer-{{ answer.id }}" class="btn btn-secondary">View</a>
        <a href="/admin/answers" class="btn btn-secondary">Cancel</a>
        <button type="submit" class="btn btn-primary">Save</button>
    </div>
</form>
{% endblock %}"##;

const ADMIN_USERS_TEMPLATE: &str = r##"{% extends "admin/base.html" %}
{% block admin %}
<div class="card">
    <table class="table">
        <tr><th>Name</th><th>Email</th><th>Role</th><th></th></tr>
        {% for u in users %}
        <tr>
            <td><a href="/user/{{ u.id }}">{{ u.fullname }}</a></td>
            <td>{{ u.email }}</td>
            <td>{{ u.role_name | default(value="-") }}</td>
            <td>
                <a href="/admin/users/{{ u.id }}/edit" class="btn btn-secondary">Edit</a>
                <form method="POST" action="/admin/users/{{ u.id }}/delete" class="inline">
                    <button type="submit" class="btn btn-danger">Delete</button>
                </form>
            </td>
        </tr>
        {% endfor %}
    </table>
</div>
{% endblock %}"##;

const ADMIN_USER_EDIT_TEMPLATE: &str = r##"{% extends "admin/base.html" %}
{% block admin %}
<form method="POST" action="/admin/users/{{ account.id }}/edit" class="card card-body">
    <label class="form-label" for="fullname">Name</label>
    <input type="text" id="fullname" name="fullname" class="form-input" value="{{ account.fullname }}" required />
    <label class="form-label" for="email">Email</label>
    <input type="email" id="email" name="email" class="form-input" value="{{ account.email }}" required />
    <label class="form-label" for="role_id">Role</label>
    <select id="role_id" name="role_id" class="form-select">
        <option value="" {% if not account.role_id %}selected{% endif %}>No role</option>
        {% for r in roles %}
        <option value="{{ r.id }}" {% if account.role_id == r.id %}selected{% endif %}>{{ r.name }}</option>
        {% endfor %}
    </select>
    <div class="form-actions">
        <a href="/admin/users" class="btn btn-secondary">Cancel</a>
        <button type="submit" class="btn btn-primary">Save</button>
    </div>
</form>
{% endblock %}"##;

const ADMIN_ROLES_TEMPLATE: &str = r##"{% extends "admin/base.html" %}
{% block admin %}
<div class="card">
    <table class="table">
        <tr><th>Name</th><th>Permissions</th><th>Default</th><th></th></tr>
        {% for r in roles %}
        <tr>
            <td>{{ r.name }}</td>
            <td><code>{{ r.permissions }}</code> <span class="meta">{{ r.permission_names | join(sep=", ") }}</span></td>
            <td>{% if r.is_default %}yes{% endif %}</td>
            <td><a href="/admin/roles/{{ r.id }}/edit" class="btn btn-secondary">Edit</a></td>
        </tr>
        {% endfor %}
    </table>
</div>
{% endblock %}"##;

const ADMIN_ROLE_EDIT_TEMPLATE: &str = r##"{% extends "admin/base.html" %}
{% block admin %}
<form method="POST" action="/admin/roles/{{ role.id }}/edit" class="card card-body">
    <label class="form-label" for="name">Name</label>
    <input type="text" id="name" name="name" class="form-input" value="{{ role.name }}" required />
    <label class="form-label" for="permissions">Permissions (decimal or 0x hex)</label>
    <input type="text" id="permissions" name="permissions" class="form-input" value="{{ role.permissions }}" required />
    <p class="meta mt-2">follow 0x01, comment 0x02, write 0x04, moderate 0x08, administer 0x80</p>
    <div class="form-actions">
        <a href="/admin/roles" class="btn btn-secondary">Cancel</a>
        <button type="submit" class="btn btn-primary">Save</button>
    </div>
</form>
{% endblock %}"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_compile() {
        Lazy::force(&TEMPLATES);
        assert!(TEMPLATES.get_template_names().any(|n| n == "404.html"));
    }

    #[test]
    fn test_answer_html_is_not_escaped() {
        let mut context = Context::new();
        context.insert("question", &serde_json::json!({
            "id": 1, "title": "<b>T</b>", "description": "", "author_id": 1,
            "author_name": "A", "created": "now", "topics": []
        }));
        context.insert("question_comments", &Vec::<serde_json::Value>::new());
        context.insert("answers", &vec![serde_json::json!({
            "id": 2, "author_id": 1, "author_name": "A", "created": "now",
            "content_html": "<p><em>hi</em></p>", "comments": []
        })]);
        context.insert("can_answer", &false);
        context.insert("can_comment", &false);

        let html = render("question.html", &context).unwrap();
        assert!(html.contains("<p><em>hi</em></p>"));
        assert!(html.contains("&lt;b&gt;T&lt;&#x2F;b&gt;"));
    }
}
