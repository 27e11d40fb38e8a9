use maud::{DOCTYPE, Markup, html};

use crate::models::MovieDetails;

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

pub fn movies_page(title: &str, movies: &[MovieDetails], messages: &[String]) -> String {
    page(
        title,
        html! {
            div class="max-w-5xl mx-auto px-6 py-10" {
                div class="flex items-start justify-between gap-6" {
                    h1 class="text-3xl font-bold text-gray-900" { (title) }
                    a class="rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" href="/movies/create" { "New movie" }
                }

                (flash_list(messages))

                @if movies.is_empty() {
                    div class="mt-10 bg-white shadow rounded-lg p-8" {
                        p class="text-gray-600" { "No movies yet." }
                    }
                } @else {
                    table class="mt-8 w-full bg-white shadow rounded-lg text-left" {
                        thead class="text-sm text-gray-500" {
                            tr {
                                th class="px-4 py-3" { "Title" }
                                th class="px-4 py-3" { "Director" }
                                th class="px-4 py-3" { "Year" }
                                th class="px-4 py-3" { "IMDb" }
                                th class="px-4 py-3" { "Genres" }
                                th class="px-4 py-3" {}
                            }
                        }
                        tbody {
                            @for movie in movies {
                                (movie_row(movie))
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn movie_page(title: &str, movie: &MovieDetails, messages: &[String]) -> String {
    page(
        &format!("{} · {}", movie.title, title),
        html! {
            div class="max-w-2xl mx-auto px-6 py-10" {
                a class="text-sm text-blue-600 hover:text-blue-800" href="/movies" { "All movies" }

                (flash_list(messages))

                div class="mt-6 bg-white shadow rounded-lg p-8" {
                    h1 class="text-3xl font-bold text-gray-900" {
                        (movie.title)
                        span class="ml-2 font-normal text-gray-500" { "(" (movie.release_year) ")" }
                    }
                    @if !movie.tagline.is_empty() {
                        p class="mt-2 italic text-gray-600" { (movie.tagline) }
                    }
                    dl class="mt-6 grid grid-cols-3 gap-4 text-sm" {
                        dt class="font-medium text-gray-700" { "Director" }
                        dd class="col-span-2 text-gray-900" { (movie.director.as_deref().unwrap_or("—")) }
                        dt class="font-medium text-gray-700" { "IMDb score" }
                        dd class="col-span-2 text-gray-900" { (format_score(movie.imdb_score)) }
                        dt class="font-medium text-gray-700" { "Genres" }
                        dd class="col-span-2 text-gray-900" { (genre_list(movie)) }
                    }
                    div class="mt-8 flex gap-4" {
                        a class="text-blue-600 hover:text-blue-800" href=(format!("/movies/{}/update", movie.id)) { "Edit" }
                        a class="text-red-600 hover:text-red-800" href=(format!("/movies/{}/delete", movie.id)) { "Delete" }
                    }
                }
            }
        },
    )
}

pub fn create_page(title: &str) -> String {
    page(
        &format!("New movie · {title}"),
        html! {
            div class="max-w-2xl mx-auto px-6 py-10" {
                a class="text-sm text-blue-600 hover:text-blue-800" href="/movies" { "All movies" }
                div class="mt-6 bg-white shadow rounded-lg p-8" {
                    h1 class="text-2xl font-bold text-gray-900" { "New movie" }
                    (movie_form("/movies", None, "Create"))
                }
            }
        },
    )
}

pub fn edit_page(title: &str, movie: &MovieDetails) -> String {
    page(
        &format!("Edit {} · {}", movie.title, title),
        html! {
            div class="max-w-2xl mx-auto px-6 py-10" {
                a class="text-sm text-blue-600 hover:text-blue-800" href=(format!("/movies/{}", movie.id)) { "Back" }
                div class="mt-6 bg-white shadow rounded-lg p-8" {
                    h1 class="text-2xl font-bold text-gray-900" { "Edit " (movie.title) }
                    (movie_form(&format!("/movies/{}", movie.id), Some(movie), "Save"))
                }
            }
        },
    )
}

pub fn error_page(message: String) -> String {
    page(
        "Error",
        html! {
            div class="min-h-screen bg-gray-50 flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-2xl font-bold text-gray-900" { "Error" }
                        p class="mt-4 text-gray-700" { (message) }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/movies" { "Back" }
                    }
                }
            }
        },
    )
}

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body class="bg-gray-50" { (body) }
        }
    }
    .into_string()
}

fn flash_list(messages: &[String]) -> Markup {
    html! {
        @if !messages.is_empty() {
            ul class="mt-6 space-y-2" {
                @for message in messages {
                    li class="rounded-md border border-green-300 bg-green-50 px-4 py-2 text-sm text-green-800" { (message) }
                }
            }
        }
    }
}

fn movie_row(movie: &MovieDetails) -> Markup {
    html! {
        tr class="border-t border-gray-100" {
            td class="px-4 py-3" {
                a class="font-semibold text-gray-900 hover:text-blue-700" href=(format!("/movies/{}", movie.id)) { (movie.title) }
                @if !movie.tagline.is_empty() {
                    p class="text-xs text-gray-500" { (movie.tagline) }
                }
            }
            td class="px-4 py-3 text-gray-700" { (movie.director.as_deref().unwrap_or("—")) }
            td class="px-4 py-3 text-gray-700" { (movie.release_year) }
            td class="px-4 py-3 text-gray-700" { (format_score(movie.imdb_score)) }
            td class="px-4 py-3" { (genre_list(movie)) }
            td class="px-4 py-3 text-sm whitespace-nowrap" {
                a class="text-blue-600 hover:text-blue-800" href=(format!("/movies/{}/update", movie.id)) { "Edit" }
                " · "
                a class="text-red-600 hover:text-red-800" href=(format!("/movies/{}/delete", movie.id)) { "Delete" }
            }
        }
    }
}

fn genre_list(movie: &MovieDetails) -> Markup {
    html! {
        @for genre in &movie.genres {
            span class="mr-1 inline-block rounded bg-gray-100 px-2 py-0.5 text-xs text-gray-700" data-genre-id=(genre.id) { (genre.genre) }
        }
    }
}

fn movie_form(action: &str, movie: Option<&MovieDetails>, submit: &str) -> Markup {
    let title = movie.map(|m| m.title.as_str()).unwrap_or_default();
    let tagline = movie.map(|m| m.tagline.as_str()).unwrap_or_default();
    let year = movie.map(|m| m.release_year.to_string()).unwrap_or_default();
    let score = movie.map(|m| format_score(m.imdb_score)).unwrap_or_default();
    let director = movie.and_then(|m| m.director.as_deref()).unwrap_or_default();

    html! {
        form class="mt-8 space-y-6" method="post" action=(action) {
            (text_field("title", "Title", title, true))
            (text_field("tagline", "Tagline", tagline, false))
            div {
                label class="block text-sm font-medium text-gray-700" for="year" { "Release year" }
                input class=(INPUT_CLASS) type="number" name="year" id="year" min="1888" value=(year) required;
            }
            div {
                label class="block text-sm font-medium text-gray-700" for="imdb_score" { "IMDb score" }
                input class=(INPUT_CLASS) type="number" name="imdb_score" id="imdb_score" min="0" max="10" step="0.1" value=(score) required;
            }
            (text_field("director", "Director", director, false))
            button class="w-full rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" type="submit" { (submit) }
        }
    }
}

const INPUT_CLASS: &str = "mt-2 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500";

fn text_field(name: &str, label: &str, value: &str, required: bool) -> Markup {
    html! {
        div {
            label class="block text-sm font-medium text-gray-700" for=(name) { (label) }
            input class=(INPUT_CLASS) name=(name) id=(name) value=(value) maxlength="255" required[required];
        }
    }
}

fn format_score(score: f64) -> String {
    format!("{score:.1}")
}
